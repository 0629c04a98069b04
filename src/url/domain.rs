use url::Url;

/// Builds the key used to group connections to the same host
///
/// The key is the lowercase host joined with the effective port, so
/// `http://example.com` and `https://example.com` count separately, the same
/// way a connection pool would.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use hn_archiver::url::host_key;
///
/// let url = Url::parse("https://EXAMPLE.com/path").unwrap();
/// assert_eq!(host_key(&url), Some("example.com:443".to_string()));
/// ```
pub fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port_or_known_default() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}
