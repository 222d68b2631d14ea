//! Building blocks shared by HTTP handlers

pub mod api_response;
pub mod pagination_query;

pub use api_response::ApiResponse;
pub use pagination_query::{PaginationParams, PaginationQuery};
