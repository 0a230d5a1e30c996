use serde::{Deserialize, Serialize};

pub const QUERY: &str = include_str!("update_highlight.graphql");

#[derive(Debug, Serialize)]
pub struct UpdateHighlightVariables<'a> {
    pub input: UpdateHighlightInput<'a>,
}

#[derive(Debug, Serialize)]
pub struct UpdateHighlightInput<'a> {
    #[serde(rename = "highlightId")]
    pub highlight_id: &'a str,
    pub annotation: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct UpdateHighlightData {
    #[serde(rename = "updateHighlight")]
    pub update_highlight: Option<UpdateHighlightResult>,
}

/// Union of the server's UpdateHighlightSuccess and UpdateHighlightError variants
#[derive(Debug, Deserialize)]
pub struct UpdateHighlightResult {
    pub highlight: Option<HighlightRef>,
    #[serde(rename = "errorCodes")]
    pub error_codes: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct HighlightRef {
    pub id: String,
}
