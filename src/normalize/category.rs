//! Per-venue category mapping and keyword-based fallback inference
//! (SPEC_FULL.md §4.A point 3).

use crate::domain::{Category, Venue};

/// Map a venue's raw category string through its per-venue table; `None`
/// means "unmapped", which the caller falls back to keyword inference for.
#[must_use]
pub fn map_venue_category(venue: Venue, raw: &str) -> Option<Category> {
    let raw_lower = raw.to_lowercase();
    let table: &[(&str, Category)] = match venue {
        Venue::VenueA => &[
            ("politics", Category::Politics),
            ("elections", Category::Politics),
            ("economy", Category::Economics),
            ("economics", Category::Economics),
            ("sports", Category::Sports),
            ("crypto", Category::Cryptocurrency),
            ("cryptocurrency", Category::Cryptocurrency),
            ("tech", Category::Technology),
            ("technology", Category::Technology),
            ("climate", Category::Weather),
            ("weather", Category::Weather),
            ("entertainment", Category::Entertainment),
            ("business", Category::Business),
            ("science", Category::Science),
        ],
        Venue::VenueB => &[
            ("politics", Category::Politics),
            ("economics", Category::Economics),
            ("financials", Category::Economics),
            ("sports", Category::Sports),
            ("crypto", Category::Cryptocurrency),
            ("tech & science", Category::Technology),
            ("technology", Category::Technology),
            ("weather", Category::Weather),
            ("culture", Category::Entertainment),
            ("business", Category::Business),
            ("science", Category::Science),
        ],
    };
    table
        .iter()
        .find(|(key, _)| *key == raw_lower)
        .map(|(_, category)| *category)
}

/// Keyword-based fallback inference over the market title (§4.A point 3).
/// Returns `Category::Other` when no keyword hits.
#[must_use]
pub fn infer_category_from_title(title: &str) -> Category {
    let title_lower = title.to_lowercase();
    let keyword_table: &[(&str, Category)] = &[
        ("election", Category::Politics),
        ("president", Category::Politics),
        ("congress", Category::Politics),
        ("senate", Category::Politics),
        ("fed", Category::Economics),
        ("inflation", Category::Economics),
        ("gdp", Category::Economics),
        ("nfl", Category::Sports),
        ("nba", Category::Sports),
        ("world cup", Category::Sports),
        ("bitcoin", Category::Cryptocurrency),
        ("ethereum", Category::Cryptocurrency),
        ("crypto", Category::Cryptocurrency),
        ("ai ", Category::Technology),
        ("artificial intelligence", Category::Technology),
        ("rain", Category::Weather),
        ("hurricane", Category::Weather),
        ("temperature", Category::Weather),
        ("movie", Category::Entertainment),
        ("oscar", Category::Entertainment),
        ("stock", Category::Business),
        ("earnings", Category::Business),
        ("nasa", Category::Science),
        ("nobel", Category::Science),
    ];
    keyword_table
        .iter()
        .find(|(kw, _)| title_lower.contains(kw))
        .map(|(_, category)| *category)
        .unwrap_or(Category::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_venue_a_category() {
        assert_eq!(map_venue_category(Venue::VenueA, "Politics"), Some(Category::Politics));
    }

    #[test]
    fn unmapped_category_returns_none() {
        assert_eq!(map_venue_category(Venue::VenueA, "totally-unknown"), None);
    }

    #[test]
    fn infers_category_from_title_keyword() {
        assert_eq!(infer_category_from_title("Will Bitcoin hit $100k?"), Category::Cryptocurrency);
    }

    #[test]
    fn falls_back_to_other() {
        assert_eq!(infer_category_from_title("completely unrelated text"), Category::Other);
    }
}
