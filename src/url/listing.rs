/// Placeholder replaced by the current offset in the listing URL template
pub const OFFSET_PLACEHOLDER: &str = "{offset}";

/// Placeholder replaced by the page size in the listing URL template
pub const PAGE_SIZE_PLACEHOLDER: &str = "{page_size}";

/// Builds the listing URL for one catalog page
///
/// # Examples
///
/// ```
/// use catalog_harvest::url::listing_url;
///
/// let template = "https://shop.example.com/grills?pageSize={page_size}&startIndex={offset}";
/// assert_eq!(
///     listing_url(template, 200, 100),
///     "https://shop.example.com/grills?pageSize=100&startIndex=200"
/// );
/// ```
pub fn listing_url(template: &str, offset: u64, page_size: u64) -> String {
    template
        .replace(OFFSET_PLACEHOLDER, &offset.to_string())
        .replace(PAGE_SIZE_PLACEHOLDER, &page_size.to_string())
}
