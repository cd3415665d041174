//! Request classification into route classes.

use serde::{Deserialize, Serialize};
use tether_core::PartitionKind;

use crate::fetch::{Destination, Method, Request, is_extension_scheme};
use crate::strategy::Strategy;

/// Extensions (lower-case, without the dot) that mark a request as an image.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg", "ico"];

/// Category a request is assigned to; it fixes the caching strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RouteClass {
    Api,
    Image,
    Static,
}

impl RouteClass {
    pub fn strategy(&self) -> Strategy {
        match self {
            RouteClass::Api => Strategy::NetworkFirst,
            RouteClass::Image => Strategy::CacheFirst,
            RouteClass::Static => Strategy::CacheFirstWithDocumentFallback,
        }
    }

    /// Partition responses of this class are stored in.
    pub fn partition(&self) -> PartitionKind {
        match self {
            RouteClass::Api => PartitionKind::Dynamic,
            RouteClass::Image => PartitionKind::Image,
            RouteClass::Static => PartitionKind::Static,
        }
    }
}

/// Whether the worker takes ownership of this request at all.
///
/// Only GETs are cached; writes always go to the network untouched.
pub fn is_intercepted(request: &Request) -> bool {
    request.method == Method::GET && !is_extension_scheme(&request.url)
}

/// Assign a route class. Deterministic and total.
pub fn classify(request: &Request, api_prefix: &str) -> RouteClass {
    let path = request.url.path();

    if path.starts_with(api_prefix) {
        return RouteClass::Api;
    }

    if request.destination == Destination::Image || has_image_extension(path) {
        return RouteClass::Image;
    }

    RouteClass::Static
}

fn has_image_extension(path: &str) -> bool {
    let lowered = path.to_ascii_lowercase();
    match lowered.rsplit_once('.') {
        Some((_, ext)) => IMAGE_EXTENSIONS.contains(&ext),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn request(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap())
    }

    #[test]
    fn test_api_prefix() {
        assert_eq!(classify(&request("http://localhost:3000/api/events"), "/api/"), RouteClass::Api);
        assert_eq!(classify(&request("http://localhost:3000/api/logo.png"), "/api/"), RouteClass::Api);
    }

    #[test]
    fn test_api_prefix_is_a_prefix_not_a_substring() {
        assert_eq!(classify(&request("http://localhost:3000/docs/api/events"), "/api/"), RouteClass::Static);
    }

    #[test]
    fn test_image_extensions_case_insensitive() {
        for path in ["/a.jpg", "/b.JPEG", "/c.Png", "/d.gif", "/e.webp", "/f.svg", "/favicon.ico"] {
            let url = format!("http://localhost:3000/images{path}");
            assert_eq!(classify(&request(&url), "/api/"), RouteClass::Image, "{path}");
        }
    }

    #[test]
    fn test_query_does_not_affect_extension() {
        let req = request("http://localhost:3000/img/photo.png?w=300");
        assert_eq!(classify(&req, "/api/"), RouteClass::Image);
    }

    #[test]
    fn test_image_destination() {
        let req = request("http://localhost:3000/avatar/42").with_destination(Destination::Image);
        assert_eq!(classify(&req, "/api/"), RouteClass::Image);
    }

    #[test]
    fn test_static_default() {
        assert_eq!(classify(&request("http://localhost:3000/"), "/api/"), RouteClass::Static);
        assert_eq!(classify(&request("http://localhost:3000/css/style.css"), "/api/"), RouteClass::Static);
        assert_eq!(classify(&request("http://localhost:3000/pngs"), "/api/"), RouteClass::Static);
    }

    #[test]
    fn test_extension_scheme_not_intercepted() {
        assert!(!is_intercepted(&request("chrome-extension://abc/script.js")));
        assert!(is_intercepted(&request("http://localhost:3000/")));
    }

    #[test]
    fn test_writes_not_intercepted() {
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::PATCH] {
            let mut req = request("http://localhost:3000/api/events");
            req.method = method;
            assert!(!is_intercepted(&req));
        }
    }

    #[test]
    fn test_class_tables() {
        assert_eq!(RouteClass::Api.strategy(), Strategy::NetworkFirst);
        assert_eq!(RouteClass::Image.partition(), PartitionKind::Image);
        assert_eq!(RouteClass::Static.partition(), PartitionKind::Static);
    }
}
