/// HTMX utils
use axum::http::{HeaderMap, HeaderValue};

pub fn redirect(to: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "Hx-Redirect",
        HeaderValue::from_str(to)
            .unwrap_or(HeaderValue::from_static("/")),
    );
    headers
}

/// Boosted navigation and `hx-get` both set this; plain page loads don't,
/// and need the whole document.
pub fn is_partial(headers: &HeaderMap) -> bool {
    headers.contains_key("Hx-Request") && !headers.contains_key("Hx-Boosted")
}
