use serde::{Deserialize, Serialize};

pub const QUERY: &str = include_str!("create_highlight.graphql");

#[derive(Debug, Serialize)]
pub struct CreateHighlightVariables<'a> {
    pub input: CreateHighlightInput<'a>,
}

#[derive(Debug, Serialize)]
pub struct CreateHighlightInput<'a> {
    pub id: &'a str,
    #[serde(rename = "shortId")]
    pub short_id: &'a str,
    #[serde(rename = "type")]
    pub highlight_type: &'a str,
    #[serde(rename = "articleId")]
    pub article_id: &'a str,
    pub annotation: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct CreateHighlightData {
    #[serde(rename = "createHighlight")]
    pub create_highlight: Option<CreateHighlightResult>,
}

/// Union of the server's CreateHighlightSuccess and CreateHighlightError variants
#[derive(Debug, Deserialize)]
pub struct CreateHighlightResult {
    pub highlight: Option<HighlightRef>,
    #[serde(rename = "errorCodes")]
    pub error_codes: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct HighlightRef {
    pub id: String,
}
