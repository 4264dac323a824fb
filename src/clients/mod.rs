//! Client modules for external API interactions

pub mod news_client;

pub use news_client::{NewsArticle, NewsClient};
