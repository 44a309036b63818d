pub mod article;
pub mod password_reset;
pub mod review;
pub mod user;
