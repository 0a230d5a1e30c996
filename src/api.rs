use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{resolve_secret, Config};
use crate::gql_queries::{
    archive_link, article_highlights, create_highlight, save_page, update_highlight,
    GraphQLRequest, GraphQLResponse,
};
pub use crate::gql_queries::article_highlights::Highlight;
use crate::utils;

const UNAUTHORIZED_CODE: &str = "UNAUTHORIZED";
const SAVE_SOURCE: &str = "cli";
/// Highlight type the service uses for whole-item notes
const NOTE_HIGHLIGHT_TYPE: &str = "NOTE";

/// Outcome of a gateway call. Expected failures are values, not errors:
/// `Unauthorized` means the server rejected the credential (or there was
/// none) and the caller should obtain a new token; `Failure` covers every
/// other problem, transport errors included.
#[derive(Debug, PartialEq, Eq)]
pub enum ApiResult<T> {
    Success(T),
    Failure,
    Unauthorized,
}

/// A page to add to the library
#[derive(Debug)]
pub struct SavePage<'a> {
    pub url: &'a str,
    pub title: &'a str,
    /// Idempotency key; the server echoes it back as the library item id
    pub client_request_id: &'a str,
    pub original_content: &'a str,
}

/// Client for the save service's GraphQL API
pub struct ApiClient {
    api_url: String,
    api_token: Option<String>,
}

impl ApiClient {
    pub fn new(api_url: String, api_token: Option<String>) -> Self {
        ApiClient { api_url, api_token }
    }

    /// Save a page to the library. Success carries the confirmed library
    /// item id (the client request id echoed by the server).
    pub fn save_page(&self, page: &SavePage) -> ApiResult<String> {
        let variables = save_page::SavePageVariables {
            input: save_page::SavePageInput {
                source: SAVE_SOURCE,
                url: page.url,
                title: page.title,
                client_request_id: page.client_request_id,
                original_content: page.original_content,
            },
        };
        match self.run_operation("SavePage", save_page::QUERY, &variables) {
            Some(data) => classify_save_page(data),
            None => ApiResult::Failure,
        }
    }

    /// Fetch the highlights attached to a saved item
    pub fn article_highlights(&self, item_id: &str) -> ApiResult<Vec<Highlight>> {
        let variables = article_highlights::ArticleHighlightsVariables {
            username: "me",
            slug: item_id,
            include_friends_highlights: false,
        };
        match self.run_operation("GetArticle", article_highlights::QUERY, &variables) {
            Some(data) => classify_article_highlights(data),
            None => ApiResult::Failure,
        }
    }

    /// Attach a note to a saved item. The service models notes as NOTE-type
    /// highlights: an existing note gets the new text appended, otherwise a
    /// fresh highlight is created. The read and the write are separate calls
    /// with no server-side transaction, so concurrent note edits on the same
    /// item can lose one of the updates.
    pub fn add_note(&self, item_id: &str, note: &str) -> ApiResult<String> {
        let highlights = match self.article_highlights(item_id) {
            ApiResult::Success(highlights) => highlights,
            ApiResult::Unauthorized => return ApiResult::Unauthorized,
            ApiResult::Failure => return ApiResult::Failure,
        };
        match find_note(highlights) {
            Some(existing) => {
                let annotation = merged_annotation(existing.annotation.as_deref(), note);
                self.update_highlight(&existing.id, &annotation)
            }
            None => self.create_highlight(item_id, note),
        }
    }

    /// Set or clear the archived flag on a saved item
    pub fn set_archived(&self, item_id: &str, archived: bool) -> ApiResult<()> {
        let variables = archive_link::ArchiveLinkVariables {
            input: archive_link::ArchiveLinkInput {
                link_id: item_id,
                archived,
            },
        };
        match self.run_operation("SetLinkArchived", archive_link::QUERY, &variables) {
            Some(data) => classify_archive_link(data),
            None => ApiResult::Failure,
        }
    }

    fn update_highlight(&self, highlight_id: &str, annotation: &str) -> ApiResult<String> {
        let variables = update_highlight::UpdateHighlightVariables {
            input: update_highlight::UpdateHighlightInput {
                highlight_id,
                annotation,
            },
        };
        match self.run_operation("UpdateHighlight", update_highlight::QUERY, &variables) {
            Some(data) => classify_update_highlight(data),
            None => ApiResult::Failure,
        }
    }

    fn create_highlight(&self, item_id: &str, note: &str) -> ApiResult<String> {
        let (id, short_id) = utils::new_highlight_ids();
        let variables = create_highlight::CreateHighlightVariables {
            input: create_highlight::CreateHighlightInput {
                id: &id,
                short_id: &short_id,
                highlight_type: NOTE_HIGHLIGHT_TYPE,
                article_id: item_id,
                annotation: note,
            },
        };
        match self.run_operation("CreateHighlight", create_highlight::QUERY, &variables) {
            Some(data) => classify_create_highlight(data),
            None => ApiResult::Failure,
        }
    }

    /// Run one request and hand back its `data` payload, downgrading every
    /// transport-level problem to `None` after logging it once. No retries.
    fn run_operation<V: Serialize, D: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: &V,
    ) -> Option<D> {
        match self.gql_request(operation, query, variables) {
            Ok(data) => Some(data),
            Err(err) => {
                warn!("'{operation}' request did not complete: {err:#}");
                None
            }
        }
    }

    fn gql_request<V: Serialize, D: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: &V,
    ) -> Result<D> {
        let request = GraphQLRequest {
            query: query.to_string(),
            variables: serde_json::to_value(variables)
                .with_context(|| format!("Failed to serialize '{operation}' variables"))?,
        };
        let mut http_request = ureq::post(&self.api_url)
            .set("Accept", "application/json")
            .set("Content-Type", "application/json");
        if let Some(token) = &self.api_token {
            http_request = http_request.set("Authorization", token);
        }
        let response: GraphQLResponse<D> = http_request
            .send_json(&request)
            .with_context(|| format!("'{operation}' request to {} failed", self.api_url))?
            .into_json()
            .with_context(|| format!("Failed to parse '{operation}' response as JSON"))?;
        if let Some(errors) = &response.errors {
            for error in errors {
                debug!("'{operation}' server error: {}", error.message);
            }
        }
        response
            .data
            .ok_or_else(|| anyhow!("'{operation}' response contained no data"))
    }
}

pub fn create_api_client(config: &Config) -> anyhow::Result<ApiClient> {
    let api_token = match &config.api_token {
        Some(raw) => Some(
            resolve_secret(raw).with_context(|| "Failed to resolve api_token from config")?,
        ),
        None => None,
    };
    Ok(ApiClient::new(config.api_url.clone(), api_token))
}

fn classify_save_page(data: save_page::SavePageData) -> ApiResult<String> {
    let Some(result) = data.save_page else {
        warn!("Save page reply had no savePage field");
        return ApiResult::Failure;
    };
    if let Some(codes) = reported_errors(&result.error_codes) {
        warn!("Save page rejected by server: {codes:?}");
        return error_outcome(codes);
    }
    match result.client_request_id {
        Some(item_id) => ApiResult::Success(item_id),
        None => {
            warn!("Save page reply was missing clientRequestId");
            ApiResult::Failure
        }
    }
}

fn classify_article_highlights(data: article_highlights::ArticleData) -> ApiResult<Vec<Highlight>> {
    let Some(result) = data.article else {
        warn!("Article reply had no article field");
        return ApiResult::Failure;
    };
    if let Some(codes) = reported_errors(&result.error_codes) {
        warn!("Article lookup rejected by server: {codes:?}");
        return error_outcome(codes);
    }
    match result.article {
        Some(article) => ApiResult::Success(article.highlights),
        None => {
            warn!("Article reply was missing the article body");
            ApiResult::Failure
        }
    }
}

fn classify_update_highlight(data: update_highlight::UpdateHighlightData) -> ApiResult<String> {
    let Some(result) = data.update_highlight else {
        warn!("Update highlight reply had no updateHighlight field");
        return ApiResult::Failure;
    };
    if let Some(codes) = reported_errors(&result.error_codes) {
        warn!("Update highlight rejected by server: {codes:?}");
        return error_outcome(codes);
    }
    match result.highlight {
        Some(highlight) => ApiResult::Success(highlight.id),
        None => {
            warn!("Update highlight reply was missing the highlight");
            ApiResult::Failure
        }
    }
}

fn classify_create_highlight(data: create_highlight::CreateHighlightData) -> ApiResult<String> {
    let Some(result) = data.create_highlight else {
        warn!("Create highlight reply had no createHighlight field");
        return ApiResult::Failure;
    };
    if let Some(codes) = reported_errors(&result.error_codes) {
        warn!("Create highlight rejected by server: {codes:?}");
        return error_outcome(codes);
    }
    match result.highlight {
        Some(highlight) => ApiResult::Success(highlight.id),
        None => {
            warn!("Create highlight reply was missing the highlight");
            ApiResult::Failure
        }
    }
}

fn classify_archive_link(data: archive_link::ArchiveLinkData) -> ApiResult<()> {
    let Some(result) = data.set_link_archived else {
        warn!("Archive reply had no setLinkArchived field");
        return ApiResult::Failure;
    };
    if let Some(codes) = reported_errors(&result.error_codes) {
        warn!("Archive rejected by server: {codes:?}");
        return error_outcome(codes);
    }
    ApiResult::Success(())
}

fn reported_errors(codes: &Option<Vec<String>>) -> Option<&[String]> {
    match codes {
        Some(codes) if !codes.is_empty() => Some(codes),
        _ => None,
    }
}

fn error_outcome<T>(codes: &[String]) -> ApiResult<T> {
    if codes.iter().any(|code| code == UNAUTHORIZED_CODE) {
        ApiResult::Unauthorized
    } else {
        ApiResult::Failure
    }
}

fn find_note(highlights: Vec<Highlight>) -> Option<Highlight> {
    highlights
        .into_iter()
        .find(|highlight| highlight.highlight_type == NOTE_HIGHLIGHT_TYPE)
}

fn merged_annotation(existing: Option<&str>, note: &str) -> String {
    match existing {
        Some(current) => format!("{current}\n\n{note}"),
        None => note.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::{Mutex, OnceLock};
    use std::thread;

    use super::*;
    use serde_json::json;

    struct CapturingLogger {
        records: Mutex<Vec<(log::Level, String)>>,
    }

    impl log::Log for CapturingLogger {
        fn enabled(&self, _metadata: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            self.records
                .lock()
                .unwrap()
                .push((record.level(), record.args().to_string()));
        }

        fn flush(&self) {}
    }

    /// Install (once, process-wide) a logger that keeps every record so
    /// tests can assert on emitted diagnostics.
    fn captured_logs() -> &'static CapturingLogger {
        static LOGGER: OnceLock<CapturingLogger> = OnceLock::new();
        let logger = LOGGER.get_or_init(|| CapturingLogger {
            records: Mutex::new(Vec::new()),
        });
        let _ = log::set_logger(logger);
        log::set_max_level(log::LevelFilter::Debug);
        logger
    }

    /// Minimal single-request HTTP server: accepts one POST, returns the
    /// canned JSON body, and hands the raw request head back through the
    /// join handle so tests can inspect the headers that went out.
    fn spawn_canned_server(reply_body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut data = Vec::new();
            let mut buffer = [0u8; 4096];
            let header_end = loop {
                let read = stream.read(&mut buffer).unwrap();
                data.extend_from_slice(&buffer[..read]);
                if let Some(pos) = data.windows(4).position(|window| window == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let headers = String::from_utf8_lossy(&data[..header_end]).to_string();
            let content_length = headers
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            while data.len() < header_end + content_length {
                let read = stream.read(&mut buffer).unwrap();
                data.extend_from_slice(&buffer[..read]);
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                reply_body.len(),
                reply_body
            );
            stream.write_all(response.as_bytes()).unwrap();
            headers
        });
        (format!("http://{addr}/api/graphql"), handle)
    }

    const SAVE_SUCCESS_REPLY: &str =
        r#"{"data":{"savePage":{"url":"https://a.com","clientRequestId":"id-1"}}}"#;

    fn test_page() -> SavePage<'static> {
        SavePage {
            url: "https://a.com",
            title: "A",
            client_request_id: "id-1",
            original_content: "<html/>",
        }
    }

    fn save_page_data(value: serde_json::Value) -> save_page::SavePageData {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_save_page_success_carries_item_id() {
        let data = save_page_data(json!({
            "savePage": {"url": "https://a.com", "clientRequestId": "id-1"}
        }));
        assert_eq!(
            classify_save_page(data),
            ApiResult::Success("id-1".to_string())
        );
    }

    #[test]
    fn test_save_page_empty_error_codes_is_success() {
        let data = save_page_data(json!({
            "savePage": {"clientRequestId": "id-1", "errorCodes": []}
        }));
        assert_eq!(
            classify_save_page(data),
            ApiResult::Success("id-1".to_string())
        );
    }

    #[test]
    fn test_save_page_unauthorized() {
        let data = save_page_data(json!({
            "savePage": {"errorCodes": ["UNAUTHORIZED"]}
        }));
        assert_eq!(classify_save_page(data), ApiResult::Unauthorized);
    }

    #[test]
    fn test_unauthorized_wins_over_other_codes() {
        let data = save_page_data(json!({
            "savePage": {"errorCodes": ["BAD_DATA", "UNAUTHORIZED", "NOT_FOUND"]}
        }));
        assert_eq!(classify_save_page(data), ApiResult::Unauthorized);
    }

    #[test]
    fn test_save_page_other_codes_are_failure() {
        let data = save_page_data(json!({
            "savePage": {"errorCodes": ["BAD_DATA"]}
        }));
        assert_eq!(classify_save_page(data), ApiResult::Failure);
    }

    #[test]
    fn test_save_page_missing_result_field_fails_closed() {
        assert_eq!(classify_save_page(save_page_data(json!({}))), ApiResult::Failure);
    }

    #[test]
    fn test_save_page_missing_item_id_fails_closed() {
        let data = save_page_data(json!({"savePage": {"url": "https://a.com"}}));
        assert_eq!(classify_save_page(data), ApiResult::Failure);
    }

    #[test]
    fn test_archive_not_found_is_failure() {
        let data: archive_link::ArchiveLinkData = serde_json::from_value(json!({
            "setLinkArchived": {"errorCodes": ["NOT_FOUND"]}
        }))
        .unwrap();
        assert_eq!(classify_archive_link(data), ApiResult::Failure);
    }

    #[test]
    fn test_archive_success() {
        let data: archive_link::ArchiveLinkData = serde_json::from_value(json!({
            "setLinkArchived": {"linkId": "item-1", "message": "archived"}
        }))
        .unwrap();
        assert_eq!(classify_archive_link(data), ApiResult::Success(()));
    }

    #[test]
    fn test_article_highlights_extracted() {
        let data: article_highlights::ArticleData = serde_json::from_value(json!({
            "article": {
                "article": {
                    "highlights": [
                        {"id": "h-1", "type": "HIGHLIGHT", "annotation": null},
                        {"id": "h-2", "type": "NOTE", "annotation": "old note"},
                    ]
                }
            }
        }))
        .unwrap();
        let ApiResult::Success(highlights) = classify_article_highlights(data) else {
            panic!("expected success");
        };
        assert_eq!(highlights.len(), 2);
        let note = find_note(highlights).unwrap();
        assert_eq!(note.id, "h-2");
    }

    #[test]
    fn test_article_unauthorized() {
        let data: article_highlights::ArticleData = serde_json::from_value(json!({
            "article": {"errorCodes": ["UNAUTHORIZED"]}
        }))
        .unwrap();
        assert_eq!(classify_article_highlights(data), ApiResult::Unauthorized);
    }

    #[test]
    fn test_update_highlight_success_carries_id() {
        let data: update_highlight::UpdateHighlightData = serde_json::from_value(json!({
            "updateHighlight": {"highlight": {"id": "h-2"}}
        }))
        .unwrap();
        assert_eq!(
            classify_update_highlight(data),
            ApiResult::Success("h-2".to_string())
        );
    }

    #[test]
    fn test_create_highlight_missing_highlight_fails_closed() {
        let data: create_highlight::CreateHighlightData = serde_json::from_value(json!({
            "createHighlight": {}
        }))
        .unwrap();
        assert_eq!(classify_create_highlight(data), ApiResult::Failure);
    }

    #[test]
    fn test_merged_annotation_appends() {
        assert_eq!(merged_annotation(Some("old"), "new"), "old\n\nnew");
        assert_eq!(merged_annotation(None, "new"), "new");
    }

    #[test]
    fn test_missing_token_stays_absent() {
        let config = Config {
            api_url: "http://localhost:4000/api/graphql".to_string(),
            api_token: None,
        };
        let client = create_api_client(&config).unwrap();
        assert!(client.api_token.is_none());
    }

    #[test]
    fn test_network_error_is_failure() {
        // Nothing listens on port 9; the request must come back as a plain
        // failure with no payload and no retry.
        let client = ApiClient::new("http://127.0.0.1:9/api/graphql".to_string(), None);
        let outcome = client.save_page(&test_page());
        assert_eq!(outcome, ApiResult::Failure);
    }

    #[test]
    fn test_network_error_logs_one_diagnostic() {
        let logger = captured_logs();
        // Unique path so this test's records are distinguishable from any
        // other test hitting the same dead port.
        let client = ApiClient::new("http://127.0.0.1:9/diagnostics".to_string(), None);
        let outcome = client.save_page(&test_page());
        assert_eq!(outcome, ApiResult::Failure);
        let warn_count = logger
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|(level, message)| {
                *level == log::Level::Warn && message.contains("127.0.0.1:9/diagnostics")
            })
            .count();
        assert_eq!(warn_count, 1);
    }

    #[test]
    fn test_request_without_token_omits_authorization_header() {
        let (api_url, server) = spawn_canned_server(SAVE_SUCCESS_REPLY);
        let client = ApiClient::new(api_url, None);
        let outcome = client.save_page(&test_page());
        assert_eq!(outcome, ApiResult::Success("id-1".to_string()));
        let headers = server.join().unwrap();
        assert!(!headers.to_ascii_lowercase().contains("authorization"));
    }

    #[test]
    fn test_request_with_token_sends_authorization_header() {
        let (api_url, server) = spawn_canned_server(SAVE_SUCCESS_REPLY);
        let client = ApiClient::new(api_url, Some("tok-123".to_string()));
        let outcome = client.save_page(&test_page());
        assert_eq!(outcome, ApiResult::Success("id-1".to_string()));
        let headers = server.join().unwrap();
        let authorization = headers.lines().find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("authorization")
                .then(|| value.trim().to_string())
        });
        assert_eq!(authorization.as_deref(), Some("tok-123"));
    }
}
