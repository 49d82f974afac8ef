use url::Url;

/// Returns the key used to group requests by origin host
///
/// The host is lowercased and an explicit port is kept, so two services on
/// the same machine are rate limited separately.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use catalog_harvest::url::host_key;
///
/// let url = Url::parse("https://EXAMPLE.com/path").unwrap();
/// assert_eq!(host_key(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(host_key(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}
