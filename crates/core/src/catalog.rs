//! Cuisine and taste keyword catalog shared by both provider backends.
//!
//! Keyword values are the literal query terms the Chinese mapping providers
//! understand; provider-specific category codes live in the adapters.

/// Generic query term used when no taste, cuisine, or keyword narrows the
/// search, and for every scope-broadening retry.
pub const FALLBACK_KEYWORD: &str = "美食";

/// Qualifier appended to the query when the caller wants delivery-capable
/// venues only.
pub const DELIVERY_KEYWORD: &str = "外卖";

/// Primary results below this count trigger the multi-category top-up merge.
pub const MERGE_THRESHOLD: usize = 10;

/// Venues kept by the terminal unfiltered fallback.
pub const FALLBACK_LIMIT: usize = 5;

const TASTE_CUISINES: &[(&str, &[&str])] = &[
    ("清淡", &["粤菜", "日料", "素食"]),
    ("辣", &["川菜", "湘菜", "火锅"]),
    ("鲜", &["海鲜", "日料", "粤菜"]),
];

/// Ordered candidate cuisines for a taste preference, best match first.
/// Unrecognized tastes map to an empty list.
pub fn cuisines_for_taste(taste: &str) -> &'static [&'static str] {
    TASTE_CUISINES
        .iter()
        .find(|(name, _)| *name == taste.trim())
        .map(|(_, cuisines)| *cuisines)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::cuisines_for_taste;

    #[test]
    fn taste_maps_to_ordered_cuisines() {
        assert_eq!(cuisines_for_taste("辣"), ["川菜", "湘菜", "火锅"]);
        assert_eq!(cuisines_for_taste(" 清淡 "), ["粤菜", "日料", "素食"]);
    }

    #[test]
    fn unknown_taste_maps_to_empty_list() {
        assert!(cuisines_for_taste("甜").is_empty());
        assert!(cuisines_for_taste("").is_empty());
    }
}
