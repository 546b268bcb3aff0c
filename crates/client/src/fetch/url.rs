//! URL resolution against the worker origin.

use url::Url;

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("not an origin: {0}")]
    NotAnOrigin(String),
}

/// Parse an origin such as `https://app.example.com` (a trailing `/` is allowed).
///
/// The returned URL has path `/` and no query or fragment.
pub fn parse_origin(input: &str) -> Result<Url, UrlError> {
    let parsed = parse_http(input.trim())?;
    if parsed.path() != "/" || parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(UrlError::NotAnOrigin(input.to_string()));
    }
    Ok(parsed)
}

/// Resolve a path or absolute URL against `origin`.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Join relative references onto the origin
/// 3. Require an http(s) scheme
/// 4. Remove fragment (#...); the query string is kept as-is
pub fn resolve(origin: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut resolved = origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    check_scheme(&resolved)?;
    resolved.set_fragment(None);

    Ok(resolved)
}

/// Same scheme, host and port.
pub fn is_same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

fn parse_http(input: &str) -> Result<Url, UrlError> {
    if input.is_empty() {
        return Err(UrlError::Empty);
    }
    let parsed = Url::parse(input).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    check_scheme(&parsed)?;
    Ok(parsed)
}

fn check_scheme(url: &Url) -> Result<(), UrlError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        parse_origin("http://localhost:3000").unwrap()
    }

    #[test]
    fn test_parse_origin() {
        let url = parse_origin("https://App.Example.com/").unwrap();
        assert_eq!(url.as_str(), "https://app.example.com/");
    }

    #[test]
    fn test_parse_origin_rejects_path() {
        assert!(matches!(parse_origin("https://example.com/app"), Err(UrlError::NotAnOrigin(_))));
        assert!(matches!(parse_origin("ftp://example.com"), Err(UrlError::UnsupportedScheme(_))));
        assert!(matches!(parse_origin(""), Err(UrlError::Empty)));
    }

    #[test]
    fn test_resolve_path() {
        let url = resolve(&origin(), "/styles.css").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/styles.css");
    }

    #[test]
    fn test_resolve_root() {
        let url = resolve(&origin(), "/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/");
    }

    #[test]
    fn test_resolve_absolute_keeps_other_origin() {
        let url = resolve(&origin(), "https://cdn.example.com/lib.js").unwrap();
        assert_eq!(url.host_str(), Some("cdn.example.com"));
        assert!(!is_same_origin(&url, &origin()));
    }

    #[test]
    fn test_resolve_removes_fragment_keeps_query() {
        let url = resolve(&origin(), "  /page?tab=2#comments ").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/page?tab=2");
    }

    #[test]
    fn test_resolve_unsupported_scheme() {
        assert!(matches!(resolve(&origin(), "file:///etc/passwd"), Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve(&origin(), "   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_same_origin_port_matters() {
        let other = Url::parse("http://localhost:3001/").unwrap();
        assert!(!is_same_origin(&origin(), &other));
        let same = Url::parse("http://LOCALHOST:3000/a/b").unwrap();
        assert!(is_same_origin(&origin(), &same));
    }
}
