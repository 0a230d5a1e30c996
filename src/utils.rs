use uuid::Uuid;

/// Idempotency key sent with a save request; the server echoes it back as
/// the library item id, so retries with the same key are safe.
pub fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Fresh id pair for a highlight: the full uuid plus the short form the
/// service uses in share URLs.
pub fn new_highlight_ids() -> (String, String) {
    let id = Uuid::new_v4();
    let short_id = id.simple().to_string()[..8].to_string();
    (id.to_string(), short_id)
}
