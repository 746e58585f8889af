//! Classification rule tables and predicates
//!
//! Every heuristic is driven by one of the tables below so the rule sets can
//! be inspected and tested on their own.

/// Labels that are placeholders rather than brands (case-insensitive, exact)
pub const BRAND_STOPLIST: &[&str] = &["generic", "usda", "brand", "unknown", "n/a", "none"];

/// Labels that are never restaurants (case-insensitive, exact)
pub const RESTAURANT_STOPLIST: &[&str] = &["generic", "brand", "usda", "fresh", "organic", "natural"];

/// Substrings that mark a label as a likely restaurant
pub const RESTAURANT_INDICATORS: &[&str] = &[
    "restaurant", "grill", "cafe", "diner", "kitchen", "house", "tavern", "bar", "pub", "bistro",
    "eatery", "cantina", "steakhouse", "pizzeria", "pizza", "burger", "taco", "chicken", "seafood",
    "bbq", "barbecue", "sandwich", "sub", "bagel", "donut", "coffee", "buffet", "express", "wings",
    "ribs", "steak", "fresh", "golden", "royal", "famous", "drive", "inn", "hut", "king", "queen",
    "star", "corner", "place",
];

/// Tokens never kept as categories
pub const CATEGORY_STOPLIST: &[&str] = &[
    "the", "and", "with", "for", "per", "cup", "tbsp", "tsp", "oz", "gram", "piece", "generic",
];

/// Inclusive character-length bounds of a brand label
pub const BRAND_LENGTH: (usize, usize) = (2, 50);

/// Shortest label considered as a restaurant
pub const RESTAURANT_MIN_LENGTH: usize = 3;

/// Inclusive character-length bounds of a proper-noun restaurant label
pub const PROPER_NOUN_LENGTH: (usize, usize) = (4, 50);

/// Inclusive character-length bounds of a category token
pub const CATEGORY_TOKEN_LENGTH: (usize, usize) = (3, 20);

fn in_range(len: usize, (min, max): (usize, usize)) -> bool {
    len >= min && len <= max
}

fn is_stoplisted(table: &[&str], lowered: &str) -> bool {
    table.iter().any(|entry| *entry == lowered)
}

/// Returns true if the first character equals its own uppercase form
///
/// Digits and symbols pass, so "7-Eleven" counts as capitalized.
pub fn starts_uppercase(name: &str) -> bool {
    match name.chars().next() {
        Some(first) => first.to_uppercase().eq(std::iter::once(first)),
        None => false,
    }
}

/// Checks whether an associated label looks like a real brand
///
/// # Arguments
///
/// * `name` - The trimmed associated label of a search result
///
/// # Returns
///
/// * `true` - Not a placeholder, 2 to 50 characters, capitalized
/// * `false` - Otherwise
pub fn is_valid_brand_label(name: &str) -> bool {
    if is_stoplisted(BRAND_STOPLIST, &name.to_lowercase()) {
        return false;
    }

    if !in_range(name.chars().count(), BRAND_LENGTH) {
        return false;
    }

    starts_uppercase(name)
}

/// Checks whether an associated label looks like a restaurant
///
/// The strict variant requires an indicator substring. The permissive variant
/// also accepts capitalized labels of 4 to 50 characters.
pub fn is_likely_restaurant_label(name: &str, permissive: bool) -> bool {
    let lowered = name.to_lowercase();

    if is_stoplisted(RESTAURANT_STOPLIST, &lowered) {
        return false;
    }

    let len = name.chars().count();
    if len < RESTAURANT_MIN_LENGTH {
        return false;
    }

    let has_indicator = RESTAURANT_INDICATORS
        .iter()
        .any(|indicator| lowered.contains(indicator));

    has_indicator || (permissive && starts_uppercase(name) && in_range(len, PROPER_NOUN_LENGTH))
}

/// Splits a display name into category tokens
///
/// Tokens are lowercased, split on anything that is not alphanumeric, kept
/// only within the length bounds, and never stoplisted or purely numeric.
pub fn category_tokens(display_name: &str) -> Vec<String> {
    display_name
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| in_range(token.chars().count(), CATEGORY_TOKEN_LENGTH))
        .filter(|token| !is_stoplisted(CATEGORY_STOPLIST, token))
        .filter(|token| !token.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .collect()
}
