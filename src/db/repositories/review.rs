use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::reviews;

#[derive(Debug, Clone)]
pub struct Review {
    pub id: i32,
    pub rating: i32,
    pub body: String,
    pub author_username: String,
    pub created_at: String,
}

impl From<reviews::Model> for Review {
    fn from(model: reviews::Model) -> Self {
        Self {
            id: model.id,
            rating: model.rating,
            body: model.body,
            author_username: model.author_username,
            created_at: model.created_at,
        }
    }
}

pub struct ReviewRepository {
    conn: DatabaseConnection,
}

impl ReviewRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, rating: i32, body: &str, author: &str) -> Result<Review> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = reviews::ActiveModel {
            rating: Set(rating),
            body: Set(body.to_string()),
            author_username: Set(author.to_string()),
            created_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert review")?;

        Ok(Review::from(model))
    }

    pub async fn get(&self, id: i32) -> Result<Option<Review>> {
        let review = reviews::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query review by ID")?;

        Ok(review.map(Review::from))
    }

    pub async fn get_many(&self, ids: &[i32]) -> Result<Vec<Review>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = reviews::Entity::find()
            .filter(reviews::Column::Id.is_in(ids.to_vec()))
            .all(&self.conn)
            .await
            .context("Failed to query reviews by IDs")?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    pub async fn find_by_author(&self, author: &str) -> Result<Vec<Review>> {
        let rows = reviews::Entity::find()
            .filter(reviews::Column::AuthorUsername.eq(author))
            .all(&self.conn)
            .await
            .context("Failed to query reviews by author")?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    /// Rewrite the author field of one review during a rename cascade.
    pub async fn set_author(&self, id: i32, new_author: &str) -> Result<()> {
        let model = reviews::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query review for author rewrite")?
            .ok_or_else(|| anyhow::anyhow!("Review not found: {id}"))?;

        let mut active: reviews::ActiveModel = model.into();
        active.author_username = Set(new_author.to_string());
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn delete(&self, id: i32) -> Result<()> {
        reviews::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete review")?;

        Ok(())
    }
}
