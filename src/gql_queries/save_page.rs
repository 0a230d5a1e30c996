use serde::{Deserialize, Serialize};

pub const QUERY: &str = include_str!("save_page.graphql");

#[derive(Debug, Serialize)]
pub struct SavePageVariables<'a> {
    pub input: SavePageInput<'a>,
}

#[derive(Debug, Serialize)]
pub struct SavePageInput<'a> {
    pub source: &'a str,
    pub url: &'a str,
    pub title: &'a str,
    #[serde(rename = "clientRequestId")]
    pub client_request_id: &'a str,
    #[serde(rename = "originalContent")]
    pub original_content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SavePageData {
    #[serde(rename = "savePage")]
    pub save_page: Option<SavePageResult>,
}

/// Union of the server's SaveSuccess and SaveError variants
#[derive(Debug, Deserialize)]
pub struct SavePageResult {
    pub url: Option<String>,
    #[serde(rename = "clientRequestId")]
    pub client_request_id: Option<String>,
    #[serde(rename = "errorCodes")]
    pub error_codes: Option<Vec<String>>,
}
