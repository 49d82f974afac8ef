/// Removes embedded newlines and trims surrounding whitespace
///
/// # Examples
///
/// ```
/// use catalog_harvest::extract::normalize_text;
///
/// assert_eq!(normalize_text("\n  $499.00\n "), "$499.00");
/// ```
pub fn normalize_text(text: &str) -> String {
    text.replace(['\n', '\r'], "").trim().to_string()
}
