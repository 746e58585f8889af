/// Derives the file-safe key of an entity name
///
/// The key is lowercase ASCII alphanumerics separated by single underscores.
/// Apostrophes are removed first so possessives fold into the word they
/// belong to, then every run of other characters becomes one `_`, and
/// leading and trailing separators are dropped.
///
/// # Arguments
///
/// * `name` - The entity's canonical display name
///
/// # Returns
///
/// The normalized key, which may be empty if the name has no ASCII
/// alphanumerics at all
///
/// # Examples
///
/// ```
/// use food_harvest::normalize_key;
///
/// assert_eq!(normalize_key("Ben & Jerry's"), "ben_jerrys");
/// assert_eq!(normalize_key("ben_jerrys"), "ben_jerrys");
/// assert_eq!(normalize_key("  Pizza Hut!  "), "pizza_hut");
/// ```
pub fn normalize_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.chars().filter(|c| !matches!(c, '\'' | '\u{2019}')) {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !key.is_empty() {
                key.push('_');
            }
            pending_separator = false;
            key.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    key
}
