//! Paginated article listing

pub mod dto;
pub mod handlers;

pub use dto::ArticleDto;
pub use handlers::{article_paginator, list_articles, ArticlesState};
