use chrono::{DateTime, Utc};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Article row plus the author columns projected by the `author` join.
///
/// The join is aliased `writer`, so its columns arrive as `writer_*` and never
/// shadow `author_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromQueryResult, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDto {
    pub id: i32,
    pub title: String,
    pub author_id: i32,
    #[serde(rename = "authorName")]
    pub writer_name: Option<String>,
    pub views: i32,
    pub rating: Option<i32>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}
