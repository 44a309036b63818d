pub use super::article_likes::Entity as ArticleLikes;
pub use super::article_reviews::Entity as ArticleReviews;
pub use super::articles::Entity as Articles;
pub use super::password_resets::Entity as PasswordResets;
pub use super::reviews::Entity as Reviews;
pub use super::users::Entity as Users;
