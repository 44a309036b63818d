use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::article::{Article, ArticleUpdate, NewArticle};
pub use repositories::password_reset::PendingReset;
pub use repositories::review::Review;
pub use repositories::user::{NewUser, ProfileUpdate, User};

/// Facade over the three stores (identity, content, annotation) plus the
/// pending password resets. Every method is a single-document read or write;
/// multi-document consistency lives in the cascade service, not here.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn article_repo(&self) -> repositories::article::ArticleRepository {
        repositories::article::ArticleRepository::new(self.conn.clone())
    }

    fn review_repo(&self) -> repositories::review::ReviewRepository {
        repositories::review::ReviewRepository::new(self.conn.clone())
    }

    fn reset_repo(&self) -> repositories::password_reset::PasswordResetRepository {
        repositories::password_reset::PasswordResetRepository::new(self.conn.clone())
    }

    // ========== Identity store ==========

    pub async fn create_user(&self, new_user: NewUser) -> Result<User> {
        self.user_repo().create(new_user).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn update_user_profile(&self, id: i32, update: ProfileUpdate) -> Result<User> {
        self.user_repo().update_profile(id, update).await
    }

    pub async fn update_user_password_hash(&self, username: &str, new_hash: String) -> Result<()> {
        self.user_repo()
            .update_password_hash(username, new_hash)
            .await
    }

    pub async fn delete_user_record(&self, id: i32) -> Result<()> {
        self.user_repo().delete(id).await
    }

    // ========== Content store ==========

    pub async fn create_article(&self, new_article: NewArticle) -> Result<Article> {
        self.article_repo().create(new_article).await
    }

    pub async fn get_article(&self, id: i32) -> Result<Option<Article>> {
        self.article_repo().get(id).await
    }

    pub async fn list_articles(&self) -> Result<Vec<Article>> {
        self.article_repo().list_all().await
    }

    pub async fn search_articles(&self, term: &str) -> Result<Vec<Article>> {
        self.article_repo().search(term).await
    }

    pub async fn find_articles_by_owner(&self, owner: &str) -> Result<Vec<Article>> {
        self.article_repo().find_by_owner(owner).await
    }

    pub async fn find_articles_liked_by(&self, username: &str) -> Result<Vec<Article>> {
        self.article_repo().find_liked_by(username).await
    }

    pub async fn update_article(&self, id: i32, update: ArticleUpdate) -> Result<Article> {
        self.article_repo().update(id, update).await
    }

    pub async fn set_article_owner(&self, id: i32, new_owner: &str) -> Result<()> {
        self.article_repo().set_owner(id, new_owner).await
    }

    pub async fn delete_article_record(&self, id: i32) -> Result<()> {
        self.article_repo().delete(id).await
    }

    pub async fn article_likes(&self, article_id: i32) -> Result<Vec<String>> {
        self.article_repo().likes_for(article_id).await
    }

    pub async fn add_article_like(&self, article_id: i32, username: &str) -> Result<()> {
        self.article_repo().add_like(article_id, username).await
    }

    pub async fn remove_first_article_like(
        &self,
        article_id: i32,
        username: &str,
    ) -> Result<bool> {
        self.article_repo()
            .remove_first_like(article_id, username)
            .await
    }

    pub async fn remove_all_article_likes_of(
        &self,
        article_id: i32,
        username: &str,
    ) -> Result<()> {
        self.article_repo()
            .remove_all_likes_of(article_id, username)
            .await
    }

    pub async fn article_ids_liking(&self, username: &str) -> Result<Vec<i32>> {
        self.article_repo().article_ids_liking(username).await
    }

    pub async fn article_review_ids(&self, article_id: i32) -> Result<Vec<i32>> {
        self.article_repo().review_ids_for(article_id).await
    }

    pub async fn attach_review_to_article(&self, article_id: i32, review_id: i32) -> Result<()> {
        self.article_repo()
            .attach_review(article_id, review_id)
            .await
    }

    pub async fn detach_review_from_article(&self, article_id: i32, review_id: i32) -> Result<()> {
        self.article_repo()
            .detach_review(article_id, review_id)
            .await
    }

    pub async fn detach_review_everywhere(&self, review_id: i32) -> Result<()> {
        self.article_repo().detach_review_everywhere(review_id).await
    }

    // ========== Annotation store ==========

    pub async fn create_review(&self, rating: i32, body: &str, author: &str) -> Result<Review> {
        self.review_repo().create(rating, body, author).await
    }

    pub async fn get_review(&self, id: i32) -> Result<Option<Review>> {
        self.review_repo().get(id).await
    }

    pub async fn get_reviews(&self, ids: &[i32]) -> Result<Vec<Review>> {
        self.review_repo().get_many(ids).await
    }

    pub async fn find_reviews_by_author(&self, author: &str) -> Result<Vec<Review>> {
        self.review_repo().find_by_author(author).await
    }

    pub async fn set_review_author(&self, id: i32, new_author: &str) -> Result<()> {
        self.review_repo().set_author(id, new_author).await
    }

    pub async fn delete_review_record(&self, id: i32) -> Result<()> {
        self.review_repo().delete(id).await
    }

    // ========== Password resets ==========

    pub async fn upsert_password_reset(
        &self,
        username: &str,
        code: i32,
        new_password_hash: &str,
    ) -> Result<PendingReset> {
        self.reset_repo()
            .upsert(username, code, new_password_hash)
            .await
    }

    pub async fn get_password_reset(&self, username: &str) -> Result<Option<PendingReset>> {
        self.reset_repo().get_by_username(username).await
    }

    pub async fn delete_password_reset(&self, username: &str) -> Result<()> {
        self.reset_repo().delete_for_username(username).await
    }
}
