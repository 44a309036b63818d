use std::collections::HashMap;

use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::{article_likes, article_reviews, articles};

/// Article as handed to services and handlers: the stored row plus the
/// denormalized likes sequence (in append order) and the review id set.
#[derive(Debug, Clone)]
pub struct Article {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub upload_date: String,
    pub owner_username: String,
    pub likes: Vec<String>,
    pub review_ids: Vec<i32>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub upload_date: String,
    pub owner_username: String,
}

#[derive(Debug, Clone)]
pub struct ArticleUpdate {
    pub title: String,
    pub content: String,
    pub image_url: String,
}

pub struct ArticleRepository {
    conn: DatabaseConnection,
}

impl ArticleRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, new_article: NewArticle) -> Result<Article> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = articles::ActiveModel {
            title: Set(new_article.title),
            content: Set(new_article.content),
            image_url: Set(new_article.image_url),
            upload_date: Set(new_article.upload_date),
            owner_username: Set(new_article.owner_username),
            created_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert article")?;

        Ok(Self::assemble(model, Vec::new(), Vec::new()))
    }

    pub async fn get(&self, id: i32) -> Result<Option<Article>> {
        let model = articles::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query article by ID")?;

        let Some(model) = model else {
            return Ok(None);
        };

        let likes = self.likes_for(id).await?;
        let review_ids = self.review_ids_for(id).await?;

        Ok(Some(Self::assemble(model, likes, review_ids)))
    }

    /// All articles, newest first.
    pub async fn list_all(&self) -> Result<Vec<Article>> {
        let models = articles::Entity::find()
            .order_by_desc(articles::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list articles")?;

        self.attach_associations(models).await
    }

    /// Case-insensitive substring match over title, owner and body.
    pub async fn search(&self, term: &str) -> Result<Vec<Article>> {
        let models = articles::Entity::find()
            .filter(
                Condition::any()
                    .add(articles::Column::Title.contains(term))
                    .add(articles::Column::OwnerUsername.contains(term))
                    .add(articles::Column::Content.contains(term)),
            )
            .order_by_desc(articles::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to search articles")?;

        self.attach_associations(models).await
    }

    /// Articles owned by a username (exact match), newest first.
    pub async fn find_by_owner(&self, owner: &str) -> Result<Vec<Article>> {
        let models = articles::Entity::find()
            .filter(articles::Column::OwnerUsername.eq(owner))
            .order_by_desc(articles::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query articles by owner")?;

        self.attach_associations(models).await
    }

    /// Articles whose likes sequence contains the username, newest first.
    pub async fn find_liked_by(&self, username: &str) -> Result<Vec<Article>> {
        let liked_ids = self.article_ids_liking(username).await?;
        if liked_ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = articles::Entity::find()
            .filter(articles::Column::Id.is_in(liked_ids))
            .order_by_desc(articles::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query liked articles")?;

        self.attach_associations(models).await
    }

    pub async fn update(&self, id: i32, update: ArticleUpdate) -> Result<Article> {
        let model = articles::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query article for update")?
            .ok_or_else(|| anyhow::anyhow!("Article not found: {id}"))?;

        let mut active: articles::ActiveModel = model.into();
        active.title = Set(update.title);
        active.content = Set(update.content);
        active.image_url = Set(update.image_url);
        let model = active.update(&self.conn).await?;

        let likes = self.likes_for(id).await?;
        let review_ids = self.review_ids_for(id).await?;

        Ok(Self::assemble(model, likes, review_ids))
    }

    /// Rewrite the owner field of one article. The cascade service calls this
    /// per article while propagating a rename.
    pub async fn set_owner(&self, id: i32, new_owner: &str) -> Result<()> {
        let model = articles::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query article for owner rewrite")?
            .ok_or_else(|| anyhow::anyhow!("Article not found: {id}"))?;

        let mut active: articles::ActiveModel = model.into();
        active.owner_username = Set(new_owner.to_string());
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Delete the article row together with its embedded likes and review-set
    /// entries. Review records themselves are the cascade service's job.
    pub async fn delete(&self, id: i32) -> Result<()> {
        article_likes::Entity::delete_many()
            .filter(article_likes::Column::ArticleId.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to delete likes of article")?;

        article_reviews::Entity::delete_many()
            .filter(article_reviews::Column::ArticleId.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to delete review set of article")?;

        articles::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete article")?;

        Ok(())
    }

    // ---- likes sequence ----

    /// Likes in append order, duplicates included.
    pub async fn likes_for(&self, article_id: i32) -> Result<Vec<String>> {
        let rows = article_likes::Entity::find()
            .filter(article_likes::Column::ArticleId.eq(article_id))
            .order_by_asc(article_likes::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query likes")?;

        Ok(rows.into_iter().map(|r| r.username).collect())
    }

    pub async fn add_like(&self, article_id: i32, username: &str) -> Result<()> {
        let active = article_likes::ActiveModel {
            article_id: Set(article_id),
            username: Set(username.to_string()),
            ..Default::default()
        };
        active
            .insert(&self.conn)
            .await
            .context("Failed to append like")?;

        Ok(())
    }

    /// Remove the first (oldest) like entry for a username. Returns whether
    /// an entry was removed.
    pub async fn remove_first_like(&self, article_id: i32, username: &str) -> Result<bool> {
        let row = article_likes::Entity::find()
            .filter(article_likes::Column::ArticleId.eq(article_id))
            .filter(article_likes::Column::Username.eq(username))
            .order_by_asc(article_likes::Column::Id)
            .one(&self.conn)
            .await
            .context("Failed to query like for removal")?;

        let Some(row) = row else {
            return Ok(false);
        };

        article_likes::Entity::delete_by_id(row.id)
            .exec(&self.conn)
            .await
            .context("Failed to remove like")?;

        Ok(true)
    }

    /// Remove every like entry for a username on one article. Used when
    /// rewriting likes during a rename.
    pub async fn remove_all_likes_of(&self, article_id: i32, username: &str) -> Result<()> {
        article_likes::Entity::delete_many()
            .filter(article_likes::Column::ArticleId.eq(article_id))
            .filter(article_likes::Column::Username.eq(username))
            .exec(&self.conn)
            .await
            .context("Failed to remove likes of user")?;

        Ok(())
    }

    /// Distinct article ids whose likes contain the username.
    pub async fn article_ids_liking(&self, username: &str) -> Result<Vec<i32>> {
        let rows = article_likes::Entity::find()
            .filter(article_likes::Column::Username.eq(username))
            .all(&self.conn)
            .await
            .context("Failed to query likes by username")?;

        let mut ids: Vec<i32> = rows.into_iter().map(|r| r.article_id).collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    // ---- review set ----

    pub async fn review_ids_for(&self, article_id: i32) -> Result<Vec<i32>> {
        let rows = article_reviews::Entity::find()
            .filter(article_reviews::Column::ArticleId.eq(article_id))
            .order_by_asc(article_reviews::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query review set")?;

        Ok(rows.into_iter().map(|r| r.review_id).collect())
    }

    pub async fn attach_review(&self, article_id: i32, review_id: i32) -> Result<()> {
        let active = article_reviews::ActiveModel {
            article_id: Set(article_id),
            review_id: Set(review_id),
            ..Default::default()
        };
        active
            .insert(&self.conn)
            .await
            .context("Failed to attach review to article")?;

        Ok(())
    }

    /// Pull one review id out of one article's review set.
    pub async fn detach_review(&self, article_id: i32, review_id: i32) -> Result<()> {
        article_reviews::Entity::delete_many()
            .filter(article_reviews::Column::ArticleId.eq(article_id))
            .filter(article_reviews::Column::ReviewId.eq(review_id))
            .exec(&self.conn)
            .await
            .context("Failed to detach review from article")?;

        Ok(())
    }

    /// Pull a review id out of every article's review set.
    pub async fn detach_review_everywhere(&self, review_id: i32) -> Result<()> {
        article_reviews::Entity::delete_many()
            .filter(article_reviews::Column::ReviewId.eq(review_id))
            .exec(&self.conn)
            .await
            .context("Failed to detach review from all articles")?;

        Ok(())
    }

    // ---- helpers ----

    fn assemble(model: articles::Model, likes: Vec<String>, review_ids: Vec<i32>) -> Article {
        Article {
            id: model.id,
            title: model.title,
            content: model.content,
            image_url: model.image_url,
            upload_date: model.upload_date,
            owner_username: model.owner_username,
            likes,
            review_ids,
            created_at: model.created_at,
        }
    }

    /// Batch-load likes and review ids for a page of article rows.
    async fn attach_associations(&self, models: Vec<articles::Model>) -> Result<Vec<Article>> {
        if models.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = models.iter().map(|m| m.id).collect();

        let like_rows = article_likes::Entity::find()
            .filter(article_likes::Column::ArticleId.is_in(ids.clone()))
            .order_by_asc(article_likes::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to batch-load likes")?;

        let review_rows = article_reviews::Entity::find()
            .filter(article_reviews::Column::ArticleId.is_in(ids))
            .order_by_asc(article_reviews::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to batch-load review sets")?;

        let mut likes_by_article: HashMap<i32, Vec<String>> = HashMap::new();
        for row in like_rows {
            likes_by_article
                .entry(row.article_id)
                .or_default()
                .push(row.username);
        }

        let mut reviews_by_article: HashMap<i32, Vec<i32>> = HashMap::new();
        for row in review_rows {
            reviews_by_article
                .entry(row.article_id)
                .or_default()
                .push(row.review_id);
        }

        Ok(models
            .into_iter()
            .map(|m| {
                let likes = likes_by_article.remove(&m.id).unwrap_or_default();
                let review_ids = reviews_by_article.remove(&m.id).unwrap_or_default();
                Self::assemble(m, likes, review_ids)
            })
            .collect())
    }
}
