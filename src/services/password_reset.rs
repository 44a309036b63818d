use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use thiserror::Error;
use tracing::info;

use crate::clients::mail::{Delivery, MailClient};
use crate::config::SecurityConfig;
use crate::db::Store;
use crate::db::repositories::user::hash_password_blocking;

#[derive(Debug, Error)]
pub enum ResetError {
    #[error("Entered username is invalid")]
    UnknownUsername,

    #[error("Confirm password does not match the new password")]
    PasswordMismatch,

    #[error("No password reset is pending for this account")]
    NoPendingRequest,

    #[error("Please enter a valid code")]
    InvalidCode,

    #[error("The code has expired, please request a new one")]
    Expired,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy)]
pub struct ResetRequested {
    pub delivered: Delivery,
}

/// One-time-code password reset. Per username the state machine is
/// NoRequest -> Pending -> Consumed: a re-request overwrites the pending
/// record, verification consumes it.
///
/// The candidate password is stored as an Argon2 hash and the code expires
/// after a configured TTL; a consumed record is deleted so the same code
/// cannot be replayed.
#[derive(Clone)]
pub struct PasswordResetService {
    store: Store,
    mail: Arc<MailClient>,
    security: SecurityConfig,
}

impl PasswordResetService {
    #[must_use]
    pub const fn new(store: Store, mail: Arc<MailClient>, security: SecurityConfig) -> Self {
        Self {
            store,
            mail,
            security,
        }
    }

    /// Issue (or re-issue) a reset code and mail it to the account's address.
    /// Mail failure degrades to a warning for the caller; the pending record
    /// is kept either way.
    pub async fn request_reset(
        &self,
        username: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<ResetRequested, ResetError> {
        let user = self
            .store
            .get_user_by_username(username)
            .await?
            .ok_or(ResetError::UnknownUsername)?;

        if new_password != confirm_password {
            return Err(ResetError::PasswordMismatch);
        }

        let code = generate_code();
        let candidate_hash = hash_password_blocking(new_password, Some(&self.security)).await?;

        self.store
            .upsert_password_reset(username, code, &candidate_hash)
            .await?;

        let delivered = self
            .mail
            .send(
                &user.email,
                "Forgot Password",
                &format!(
                    "Here is your one time code for resetting your account password: {code}"
                ),
            )
            .await;

        info!("Password reset code issued for {}", username);

        Ok(ResetRequested { delivered })
    }

    /// Verify a submitted code against the most recently issued one. On
    /// success the stored candidate hash becomes the account password and
    /// the pending record is consumed.
    pub async fn verify_reset(&self, username: &str, code: i32) -> Result<(), ResetError> {
        let pending = self
            .store
            .get_password_reset(username)
            .await?
            .ok_or(ResetError::NoPendingRequest)?;

        if code_expired(&pending.issued_at, self.security.otp_ttl_minutes) {
            self.store.delete_password_reset(username).await?;
            return Err(ResetError::Expired);
        }

        if pending.code != code {
            return Err(ResetError::InvalidCode);
        }

        self.store
            .update_user_password_hash(username, pending.new_password_hash)
            .await?;
        self.store.delete_password_reset(username).await?;

        info!("Password reset completed for {}", username);

        Ok(())
    }

}

/// A code older than the TTL is dead; so is one whose issuance timestamp
/// does not parse.
fn code_expired(issued_at: &str, ttl_minutes: i64) -> bool {
    let Ok(issued) = DateTime::parse_from_rfc3339(issued_at) else {
        return true;
    };
    Utc::now() - issued.with_timezone(&Utc) > Duration::minutes(ttl_minutes)
}

/// Four digit code in 1000..=9999.
fn generate_code() -> i32 {
    let mut rng = rand::rng();
    rng.random_range(1000..=9999)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MailConfig;
    use crate::db::NewUser;
    use crate::entities::password_resets;
    use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

    #[test]
    fn codes_are_four_digits() {
        for _ in 0..1000 {
            let code = generate_code();
            assert!((1000..=9999).contains(&code), "out of range: {code}");
        }
    }

    #[test]
    fn expiry_is_judged_against_the_ttl() {
        let stale = (Utc::now() - Duration::minutes(11)).to_rfc3339();
        assert!(code_expired(&stale, 10));

        let fresh = (Utc::now() - Duration::minutes(9)).to_rfc3339();
        assert!(!code_expired(&fresh, 10));
    }

    #[test]
    fn unparseable_issuance_counts_as_expired() {
        assert!(code_expired("not-a-timestamp", 10));
        assert!(code_expired("", 10));
    }

    #[tokio::test]
    async fn expired_code_is_rejected_and_the_record_deleted() {
        let store = Store::with_pool_options("sqlite::memory:", 1, 1)
            .await
            .expect("failed to open in-memory store");

        store
            .create_user(NewUser {
                name: "Lena Surname".to_string(),
                email: "lena@example.com".to_string(),
                username: "lena".to_string(),
                password_hash: "unused-hash".to_string(),
                bio: String::new(),
                avatar_url: String::new(),
            })
            .await
            .unwrap();

        let security = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
            otp_ttl_minutes: 10,
        };
        let mail = Arc::new(MailClient::new(&MailConfig::default()).unwrap());
        let resets = PasswordResetService::new(store.clone(), mail, security);

        resets
            .request_reset("lena", "next-password", "next-password")
            .await
            .unwrap();
        let pending = store.get_password_reset("lena").await.unwrap().unwrap();

        // Backdate the issuance past the TTL.
        let row = password_resets::Entity::find()
            .filter(password_resets::Column::Username.eq("lena"))
            .one(&store.conn)
            .await
            .unwrap()
            .unwrap();
        let mut active: password_resets::ActiveModel = row.into();
        active.issued_at = Set((Utc::now() - Duration::minutes(30)).to_rfc3339());
        active.update(&store.conn).await.unwrap();

        assert!(matches!(
            resets.verify_reset("lena", pending.code).await,
            Err(ResetError::Expired)
        ));

        // Expired records are deleted on sight, not left pending.
        assert!(store.get_password_reset("lena").await.unwrap().is_none());
    }
}
