use thiserror::Error;
use tracing::info;

use crate::db::{ProfileUpdate, Store, User};

/// Outcome of a like toggle, reported back to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeState {
    Liked,
    Unliked,
}

#[derive(Debug, Error)]
pub enum CascadeError {
    #[error("user not found")]
    UserNotFound,

    #[error("article not found")]
    ArticleNotFound,

    #[error("username '{0}' is already taken")]
    UsernameTaken(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// The referential-integrity coordinator. Articles store their owner as a
/// username string, likes store username strings, and reviews are referenced
/// by id from articles, so every rename and delete has to rewrite the
/// denormalized copies by hand.
///
/// Every workflow here is a sequence of single-document writes with no
/// transaction and no rollback. A failure mid-sequence surfaces as
/// `Storage` and leaves the already-applied writes in place; that partial
/// state is an accepted property of the data model, not something this
/// service tries to repair.
#[derive(Clone)]
pub struct CascadeService {
    store: Store,
}

impl CascadeService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Persist a profile update, propagating a username change through every
    /// denormalized copy first. Order matters: articles, then reviews, then
    /// likes sequences, and only then the user record itself.
    pub async fn update_profile(
        &self,
        user_id: i32,
        update: ProfileUpdate,
    ) -> Result<User, CascadeError> {
        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(CascadeError::UserNotFound)?;

        if update.username != user.username {
            // Case-sensitive exact-match collision check against every other user.
            if self
                .store
                .get_user_by_username(&update.username)
                .await?
                .is_some()
            {
                return Err(CascadeError::UsernameTaken(update.username));
            }

            self.propagate_rename(&user.username, &update.username)
                .await?;
        }

        let updated = self.store.update_user_profile(user_id, update).await?;

        Ok(updated)
    }

    async fn propagate_rename(&self, old: &str, new: &str) -> Result<(), CascadeError> {
        let owned = self.store.find_articles_by_owner(old).await?;
        for article in &owned {
            self.store.set_article_owner(article.id, new).await?;
        }

        let authored = self.store.find_reviews_by_author(old).await?;
        for review in &authored {
            self.store.set_review_author(review.id, new).await?;
        }

        // Rewrite every likes sequence containing the old name. If the new
        // name is already present the old entries are dropped without
        // appending, so the sequence never ends up with a duplicate.
        let liked_article_ids = self.store.article_ids_liking(old).await?;
        for article_id in liked_article_ids {
            let likes = self.store.article_likes(article_id).await?;
            self.store.remove_all_article_likes_of(article_id, old).await?;
            if !likes.iter().any(|l| l == new) {
                self.store.add_article_like(article_id, new).await?;
            }
        }

        info!(
            "Propagated rename {} -> {} across {} articles and {} reviews",
            old,
            new,
            owned.len(),
            authored.len()
        );

        Ok(())
    }

    /// Delete an account and everything hanging off its username: the user's
    /// reviews (pulled out of every article first), then the user's articles
    /// together with the reviews those still reference, then the user record.
    ///
    /// Likes left by this user on *other* users' articles are deliberately
    /// not cleaned up; those sequences keep the dead username string.
    pub async fn delete_user(&self, user_id: i32) -> Result<(), CascadeError> {
        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(CascadeError::UserNotFound)?;

        let authored = self.store.find_reviews_by_author(&user.username).await?;
        for review in &authored {
            self.store.detach_review_everywhere(review.id).await?;
            self.store.delete_review_record(review.id).await?;
        }

        let owned = self.store.find_articles_by_owner(&user.username).await?;
        for article in &owned {
            for review_id in self.store.article_review_ids(article.id).await? {
                self.store.delete_review_record(review_id).await?;
            }
            self.store.delete_article_record(article.id).await?;
        }

        self.store.delete_user_record(user_id).await?;

        info!(
            "Deleted user {} with {} articles and {} reviews",
            user.username,
            owned.len(),
            authored.len()
        );

        Ok(())
    }

    /// Delete an article and every review its set references.
    pub async fn delete_article(&self, article_id: i32) -> Result<(), CascadeError> {
        let article = self
            .store
            .get_article(article_id)
            .await?
            .ok_or(CascadeError::ArticleNotFound)?;

        for review_id in article.review_ids {
            self.store.delete_review_record(review_id).await?;
        }

        self.store.delete_article_record(article_id).await?;

        Ok(())
    }

    /// Two-step review delete: pull the id from the article's review set,
    /// then delete the record. A crash between the steps leaves either a
    /// dangling id or an orphaned record; both are accepted.
    pub async fn delete_review(&self, article_id: i32, review_id: i32) -> Result<(), CascadeError> {
        self.store
            .detach_review_from_article(article_id, review_id)
            .await?;
        self.store.delete_review_record(review_id).await?;

        Ok(())
    }

    /// Toggle a username in an article's likes sequence: remove the first
    /// occurrence when present, append otherwise.
    pub async fn toggle_like(
        &self,
        article_id: i32,
        username: &str,
    ) -> Result<LikeState, CascadeError> {
        if self.store.get_article(article_id).await?.is_none() {
            return Err(CascadeError::ArticleNotFound);
        }

        let removed = self
            .store
            .remove_first_article_like(article_id, username)
            .await?;

        if removed {
            Ok(LikeState::Unliked)
        } else {
            self.store.add_article_like(article_id, username).await?;
            Ok(LikeState::Liked)
        }
    }
}
