//! Responses synthesised when neither cache nor network can answer.

use tether_core::ResponseSnapshot;

/// Text drawn on the placeholder image.
pub const OFFLINE_IMAGE_LABEL: &str = "オフライン中";

const OFFLINE_IMAGE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="300" height="200" viewBox="0 0 300 200"><rect width="300" height="200" fill="#2d2d2d"/><text x="150" y="100" fill="#9e9e9e" font-family="sans-serif" font-size="18" text-anchor="middle" dominant-baseline="middle">オフライン中</text></svg>"##;

const OFFLINE_DOCUMENT_HTML: &str = "<!DOCTYPE html>\
<html lang=\"ja\"><head><meta charset=\"utf-8\"><title>オフライン</title></head>\
<body><h1>オフライン</h1><p>インターネット接続を確認してください。</p></body></html>";

/// JSON error for API requests: 503 with `{"error": ..., "offline": true}`.
pub fn offline_api_response(url: &str, message: &str) -> ResponseSnapshot {
    let body = serde_json::json!({ "error": message, "offline": true });
    ResponseSnapshot::new(url, 503)
        .with_header("Content-Type", "application/json; charset=utf-8")
        .with_body(body.to_string())
}

/// 300x200 placeholder image served in place of an unreachable image.
pub fn offline_image(url: &str) -> ResponseSnapshot {
    ResponseSnapshot::new(url, 200)
        .with_header("Content-Type", "image/svg+xml")
        .with_body(OFFLINE_IMAGE_SVG)
}

/// Minimal page used when the seeded offline document is also missing.
pub fn offline_document(url: &str) -> ResponseSnapshot {
    ResponseSnapshot::new(url, 503)
        .with_header("Content-Type", "text/html; charset=utf-8")
        .with_body(OFFLINE_DOCUMENT_HTML)
}
