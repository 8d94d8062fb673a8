//! Same-origin check for browser calls.
//!
//! A request passes only when at least one of `Origin` / `Referer` is present
//! and every present one names the host the request itself was sent to.
//! Anything unparseable is a rejection, never an error.

use axum::http::{HeaderMap, Uri, header};
use reqwest::Url;

/// Host (with non-default port) of an absolute URL, as a browser reports it.
fn url_host(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Host the request was addressed to: the absolute request target when the
/// client sent one, else the `Host` header.
pub fn request_host(uri: &Uri, headers: &HeaderMap) -> Option<String> {
    let authority = match uri.authority() {
        Some(authority) => authority.as_str().to_string(),
        None => headers.get(header::HOST)?.to_str().ok()?.to_string(),
    };
    let scheme = uri.scheme_str().unwrap_or("http");
    url_host(&format!("{scheme}://{authority}"))
}

pub fn is_allowed(uri: &Uri, headers: &HeaderMap) -> bool {
    let origin = headers.get(header::ORIGIN);
    let referer = headers.get(header::REFERER);

    // Neither header: scripted call, not a page on this site
    if origin.is_none() && referer.is_none() {
        return false;
    }

    let Some(expected) = request_host(uri, headers) else {
        return false;
    };

    [origin, referer].into_iter().flatten().all(|value| {
        value
            .to_str()
            .ok()
            .and_then(url_host)
            .is_some_and(|host| host == expected)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_static(value));
        }
        map
    }

    fn path() -> Uri {
        Uri::from_static("/check-wikipedia")
    }

    #[test]
    fn rejects_when_both_headers_absent() {
        let h = headers(&[(header::HOST, "wimage.example")]);
        assert!(!is_allowed(&path(), &h));
    }

    #[test]
    fn accepts_matching_origin() {
        let h = headers(&[
            (header::HOST, "wimage.example"),
            (header::ORIGIN, "https://wimage.example"),
        ]);
        assert!(is_allowed(&path(), &h));
    }

    #[test]
    fn accepts_matching_referer_only() {
        let h = headers(&[
            (header::HOST, "localhost:4321"),
            (header::REFERER, "http://localhost:4321/upload?step=2"),
        ]);
        assert!(is_allowed(&path(), &h));
    }

    #[test]
    fn rejects_foreign_origin() {
        let h = headers(&[
            (header::HOST, "wimage.example"),
            (header::ORIGIN, "https://evil.example"),
        ]);
        assert!(!is_allowed(&path(), &h));
    }

    #[test]
    fn rejects_when_either_header_mismatches() {
        let h = headers(&[
            (header::HOST, "wimage.example"),
            (header::ORIGIN, "https://wimage.example"),
            (header::REFERER, "https://evil.example/page"),
        ]);
        assert!(!is_allowed(&path(), &h));
    }

    #[test]
    fn port_is_part_of_the_host() {
        let h = headers(&[
            (header::HOST, "localhost:4321"),
            (header::ORIGIN, "http://localhost:3000"),
        ]);
        assert!(!is_allowed(&path(), &h));
    }

    #[test]
    fn malformed_origin_is_rejected_not_raised() {
        let h = headers(&[
            (header::HOST, "wimage.example"),
            (header::ORIGIN, "not a url"),
        ]);
        assert!(!is_allowed(&path(), &h));

        let h = headers(&[(header::HOST, "wimage.example"), (header::ORIGIN, "null")]);
        assert!(!is_allowed(&path(), &h));
    }

    #[test]
    fn missing_host_is_rejected() {
        let h = headers(&[(header::ORIGIN, "https://wimage.example")]);
        assert!(!is_allowed(&path(), &h));
    }

    #[test]
    fn absolute_request_target_wins_over_host_header() {
        let uri = Uri::from_static("https://wimage.example/analyze");
        let h = headers(&[
            (header::HOST, "other.example"),
            (header::ORIGIN, "https://wimage.example"),
        ]);
        assert!(is_allowed(&uri, &h));
    }
}
