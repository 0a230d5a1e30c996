use serde::{Deserialize, Serialize};

pub const QUERY: &str = include_str!("article_highlights.graphql");

#[derive(Debug, Serialize)]
pub struct ArticleHighlightsVariables<'a> {
    pub username: &'a str,
    pub slug: &'a str,
    #[serde(rename = "includeFriendsHighlights")]
    pub include_friends_highlights: bool,
}

#[derive(Debug, Deserialize)]
pub struct ArticleData {
    pub article: Option<ArticleResult>,
}

/// Union of the server's ArticleSuccess and ArticleError variants
#[derive(Debug, Deserialize)]
pub struct ArticleResult {
    pub article: Option<Article>,
    #[serde(rename = "errorCodes")]
    pub error_codes: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct Article {
    pub highlights: Vec<Highlight>,
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct Highlight {
    pub id: String,
    #[serde(rename = "type")]
    pub highlight_type: String,
    pub annotation: Option<String>,
}
