pub mod article;
pub mod category;
pub mod classifier;
pub mod feed;
pub mod rss;
