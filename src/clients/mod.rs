pub mod mail;
pub mod newsapi;
