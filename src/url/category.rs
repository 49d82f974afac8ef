use crate::ExtractError;
use url::Url;

/// Minimum number of non-empty path segments a detail URL needs before a
/// category can be read from it
pub const MIN_CATEGORY_SEGMENTS: usize = 3;

/// Derives the product category from a detail-page URL
///
/// Detail URLs follow the shape `/<department>/.../<category>/<slug>`, so the
/// category is the path segment immediately before the trailing slug. Empty
/// segments (doubled or trailing slashes) are ignored.
///
/// # Errors
///
/// Returns [`ExtractError::TooFewSegments`] when the path has fewer than
/// [`MIN_CATEGORY_SEGMENTS`] segments instead of guessing at a value.
///
/// # Examples
///
/// ```
/// use catalog_harvest::url::category_from_url;
/// use url::Url;
///
/// let url = Url::parse("https://shop.example.com/category-x/sub/42/product-name").unwrap();
/// assert_eq!(category_from_url(&url).unwrap(), "42");
///
/// let short = Url::parse("https://shop.example.com/a/b").unwrap();
/// assert!(category_from_url(&short).is_err());
/// ```
pub fn category_from_url(url: &Url) -> Result<String, ExtractError> {
    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    if segments.len() < MIN_CATEGORY_SEGMENTS {
        return Err(ExtractError::TooFewSegments {
            url: url.to_string(),
            found: segments.len(),
        });
    }

    Ok(segments[segments.len() - 2].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_category_from_deep_path() {
        let url = parse("https://example.com/category-x/sub/42/product-name");
        assert_eq!(category_from_url(&url).unwrap(), "42");
    }

    #[test]
    fn test_category_with_trailing_slash() {
        let url = parse("https://example.com/departments/grills/gas-grills/8005960/");
        assert_eq!(category_from_url(&url).unwrap(), "gas-grills");
    }

    #[test]
    fn test_category_minimum_segments() {
        let url = parse("https://example.com/a/b/c");
        assert_eq!(category_from_url(&url).unwrap(), "b");
    }

    #[test]
    fn test_two_segments_is_structural_error() {
        let url = parse("https://example.com/a/b");
        match category_from_url(&url) {
            Err(ExtractError::TooFewSegments { found, .. }) => assert_eq!(found, 2),
            other => panic!("expected TooFewSegments, got {:?}", other),
        }
    }

    #[test]
    fn test_root_path_is_structural_error() {
        let url = parse("https://example.com/");
        assert!(category_from_url(&url).is_err());
    }

    #[test]
    fn test_query_does_not_count_as_segment() {
        let url = parse("https://example.com/a/b?x=1/2/3");
        assert!(category_from_url(&url).is_err());
    }
}
