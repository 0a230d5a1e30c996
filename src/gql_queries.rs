use serde::{Deserialize, Serialize};

pub mod archive_link;
pub mod article_highlights;
pub mod create_highlight;
pub mod save_page;
pub mod update_highlight;

/// GraphQL request structure
#[derive(Debug, Serialize)]
pub struct GraphQLRequest {
    pub query: String,
    pub variables: serde_json::Value,
}

/// GraphQL response structure
#[derive(Debug, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQLError>>,
}

/// GraphQL error structure
#[derive(Debug, Deserialize)]
pub struct GraphQLError {
    pub message: String,
}
