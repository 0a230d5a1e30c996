use serde::{Deserialize, Serialize};

pub const QUERY: &str = include_str!("archive_link.graphql");

#[derive(Debug, Serialize)]
pub struct ArchiveLinkVariables<'a> {
    pub input: ArchiveLinkInput<'a>,
}

#[derive(Debug, Serialize)]
pub struct ArchiveLinkInput<'a> {
    #[serde(rename = "linkId")]
    pub link_id: &'a str,
    pub archived: bool,
}

#[derive(Debug, Deserialize)]
pub struct ArchiveLinkData {
    #[serde(rename = "setLinkArchived")]
    pub set_link_archived: Option<ArchiveLinkResult>,
}

/// Union of the server's ArchiveLinkSuccess and ArchiveLinkError variants
#[derive(Debug, Deserialize)]
pub struct ArchiveLinkResult {
    #[serde(rename = "linkId")]
    pub link_id: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "errorCodes")]
    pub error_codes: Option<Vec<String>>,
}
