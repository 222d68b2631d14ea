//! Pagination extractor for Axum
//!
//! `PaginationQuery` reads the raw URI query into a [`PaginateDataQuery`],
//! keeping repeated keys in order and recording the request path for links.
//! Malformed pagination values are left for the normalizer to clean up.

use axum::extract::{FromRequestParts, OriginalUri, Query};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use utoipa::IntoParams;

use super::ApiResponse;
use crate::pagination::PaginateDataQuery;

pub struct PaginationQuery(pub PaginateDataQuery);

impl<S> FromRequestParts<S> for PaginationQuery
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ApiResponse<()>>);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::error(format!("Invalid query string: {}", e))),
                )
            })?;

        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map(|uri| uri.0.path().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        Ok(Self(PaginateDataQuery::from_pairs(pairs).with_path(path)))
    }
}

/// Pagination query parameters, for OpenAPI docs
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number, starting at 1
    pub page: Option<u64>,
    /// Items per page, capped by the server
    pub size: Option<u64>,
    /// Alias for `size`
    pub limit: Option<u64>,
    /// `property:asc|desc[:nullsFirst|:nullsLast]`, repeated or comma-separated
    pub sort_by: Option<Vec<String>>,
    /// Return the whole collection when the resource allows it
    pub unpaged: Option<bool>,
}
