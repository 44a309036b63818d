use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::password_resets;

#[derive(Debug, Clone)]
pub struct PendingReset {
    pub username: String,
    pub code: i32,
    pub new_password_hash: String,
    pub issued_at: String,
}

impl From<password_resets::Model> for PendingReset {
    fn from(model: password_resets::Model) -> Self {
        Self {
            username: model.username,
            code: model.code,
            new_password_hash: model.new_password_hash,
            issued_at: model.issued_at,
        }
    }
}

pub struct PasswordResetRepository {
    conn: DatabaseConnection,
}

impl PasswordResetRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create or overwrite the pending request for a username. A re-request
    /// replaces code, candidate hash and issuance time in place, so exactly
    /// one request is outstanding per username.
    pub async fn upsert(
        &self,
        username: &str,
        code: i32,
        new_password_hash: &str,
    ) -> Result<PendingReset> {
        let now = chrono::Utc::now().to_rfc3339();

        let existing = password_resets::Entity::find()
            .filter(password_resets::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query pending reset")?;

        let model = if let Some(existing) = existing {
            let mut active: password_resets::ActiveModel = existing.into();
            active.code = Set(code);
            active.new_password_hash = Set(new_password_hash.to_string());
            active.issued_at = Set(now);
            active.update(&self.conn).await?
        } else {
            let active = password_resets::ActiveModel {
                username: Set(username.to_string()),
                code: Set(code),
                new_password_hash: Set(new_password_hash.to_string()),
                issued_at: Set(now),
                ..Default::default()
            };
            active.insert(&self.conn).await?
        };

        Ok(PendingReset::from(model))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<PendingReset>> {
        let row = password_resets::Entity::find()
            .filter(password_resets::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query pending reset")?;

        Ok(row.map(PendingReset::from))
    }

    /// Consume the request. Called after a successful verification so the
    /// code cannot be replayed.
    pub async fn delete_for_username(&self, username: &str) -> Result<()> {
        password_resets::Entity::delete_many()
            .filter(password_resets::Column::Username.eq(username))
            .exec(&self.conn)
            .await
            .context("Failed to delete pending reset")?;

        Ok(())
    }
}
