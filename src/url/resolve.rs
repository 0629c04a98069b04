use crate::UrlError;
use url::Url;

/// Resolves a possibly relative link against the source origin
///
/// # Resolution Rules
///
/// 1. Surrounding whitespace is trimmed
/// 2. A link that carries a scheme is parsed as-is
/// 3. Anything else (`item?id=1`, `/newest`, `//host/path`) is joined onto `base`
/// 4. Only HTTP and HTTPS results are accepted, and they must have a host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use hn_archiver::url::resolve_url;
///
/// let base = Url::parse("https://news.ycombinator.com").unwrap();
/// let url = resolve_url(&base, "item?id=42").unwrap();
/// assert_eq!(url.as_str(), "https://news.ycombinator.com/item?id=42");
/// ```
pub fn resolve_url(base: &Url, link: &str) -> Result<Url, UrlError> {
    let link = link.trim();
    if link.is_empty() {
        return Err(UrlError::Parse("empty link".to_string()));
    }

    let url = match Url::parse(link) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => base
            .join(link)
            .map_err(|e| UrlError::Parse(e.to_string()))?,
        Err(e) => return Err(UrlError::Parse(e.to_string())),
    };

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

/// Discussion thread URL for a story id, relative to the source origin
pub fn item_url(story_id: &str) -> String {
    format!("item?id={}", story_id)
}
