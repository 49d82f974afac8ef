use url::Url;

/// Turns a raw image reference from a detail page into an absolute URL
///
/// - protocol-relative references (`//cdn...`) get an `https:` prefix
/// - references that already carry a scheme are kept as written
/// - site-relative references are resolved against the detail page URL
///
/// An empty reference stays empty so that a missing image is visible in the
/// output rather than turned into a bare `https:`.
///
/// # Examples
///
/// ```
/// use catalog_harvest::url::normalize_image_url;
/// use url::Url;
///
/// let page = Url::parse("https://shop.example.com/p/1").unwrap();
/// assert_eq!(
///     normalize_image_url("//img.example.com/a.jpg", &page),
///     "https://img.example.com/a.jpg"
/// );
/// assert_eq!(
///     normalize_image_url("/media/a.jpg", &page),
///     "https://shop.example.com/media/a.jpg"
/// );
/// ```
pub fn normalize_image_url(raw: &str, page_url: &Url) -> String {
    let raw = raw.trim();

    if raw.is_empty() {
        return String::new();
    }

    if raw.starts_with("//") {
        return format!("https:{}", raw);
    }

    match Url::parse(raw) {
        Ok(_) => raw.to_string(),
        Err(url::ParseError::RelativeUrlWithoutBase) => page_url
            .join(raw)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| raw.to_string()),
        Err(_) => raw.to_string(),
    }
}
