pub mod prelude;

pub mod article_likes;
pub mod article_reviews;
pub mod articles;
pub mod password_resets;
pub mod reviews;
pub mod users;
