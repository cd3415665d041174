//! URL resolution and request identities for consistent cache keys.

use url::Url;

/// Schemes owned by browser extensions; requests to them are never intercepted.
pub const EXTENSION_SCHEMES: &[&str] = &["chrome-extension", "moz-extension"];

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve a request target against the worker's origin.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Join root-relative or relative paths onto `origin`
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
///
/// Extension schemes are accepted so the caller can recognise and skip them.
pub fn resolve(origin: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?
        }
        Err(e) => return Err(UrlError::InvalidUrl(e.to_string())),
    };

    match parsed.scheme() {
        "http" | "https" => {}
        scheme if EXTENSION_SCHEMES.contains(&scheme) => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str()
        && host.chars().any(|c| c.is_ascii_uppercase())
    {
        let lowered = host.to_lowercase();
        parsed
            .set_host(Some(&lowered))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Whether the URL belongs to a browser extension.
pub fn is_extension_scheme(url: &Url) -> bool {
    EXTENSION_SCHEMES.contains(&url.scheme())
}

/// Cache key for a request: method plus URL, query included.
///
/// Same-origin URLs are keyed by path and query (`GET /api/events?page=2`);
/// cross-origin URLs keep the full URL.
pub fn request_identity(method: &str, url: &Url, origin: &Url) -> String {
    let method = method.to_ascii_uppercase();
    if url.origin() == origin.origin() {
        match url.query() {
            Some(query) => format!("{method} {}?{query}", url.path()),
            None => format!("{method} {}", url.path()),
        }
    } else {
        format!("{method} {url}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("http://localhost:3000").unwrap()
    }

    #[test]
    fn test_resolve_root_relative() {
        let url = resolve(&origin(), "/api/events").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/events");
    }

    #[test]
    fn test_resolve_absolute() {
        let url = resolve(&origin(), "https://cdn.jsdelivr.net/npm/x.css").unwrap();
        assert_eq!(url.host_str(), Some("cdn.jsdelivr.net"));
    }

    #[test]
    fn test_resolve_lowercase_host() {
        let url = resolve(&origin(), "https://EXAMPLE.COM/Path").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
        assert_eq!(url.path(), "/Path");
    }

    #[test]
    fn test_resolve_remove_fragment_keep_query() {
        let url = resolve(&origin(), "/search?q=tee&page=2#results").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.query(), Some("q=tee&page=2"));
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve(&origin(), "   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_resolve_unsupported_scheme() {
        let result = resolve(&origin(), "file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_resolve_extension_scheme() {
        let url = resolve(&origin(), "chrome-extension://abcdef/content.js").unwrap();
        assert!(is_extension_scheme(&url));
        assert!(!is_extension_scheme(&origin()));
    }

    #[test]
    fn test_identity_same_origin() {
        let url = resolve(&origin(), "/api/events").unwrap();
        assert_eq!(request_identity("GET", &url, &origin()), "GET /api/events");

        let url = resolve(&origin(), "/api/jobs?page=2").unwrap();
        assert_eq!(request_identity("get", &url, &origin()), "GET /api/jobs?page=2");
    }

    #[test]
    fn test_identity_cross_origin() {
        let url = resolve(&origin(), "https://cdnjs.cloudflare.com/a.css").unwrap();
        assert_eq!(request_identity("GET", &url, &origin()), "GET https://cdnjs.cloudflare.com/a.css");
    }

    #[test]
    fn test_identity_includes_method() {
        let url = resolve(&origin(), "/api/posts").unwrap();
        assert_ne!(request_identity("GET", &url, &origin()), request_identity("POST", &url, &origin()));
    }
}
