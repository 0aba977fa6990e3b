//! Topical categorization of normalized entries.
//!
//! Pure title/publisher classification: publisher overrides first, then
//! keyword patterns in a fixed priority order, then the default. No state,
//! no side effects.

use once_cell::sync::Lazy;
use regex::Regex;

/// Category assigned when neither an override nor a keyword matches.
pub const DEFAULT_CATEGORY: &str = "News";

/// Keyword patterns tested against the lower-cased title, in priority order.
/// The first match wins, so e.g. "international basketball tournament" is
/// World, not Sports.
static KEYWORD_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (
            r"\b(world|international|global|overseas|abroad)\b",
            "World",
        ),
        (
            r"\b(food|recipes?|cuisine|restaurants?|eat|drinks?|cafes?|dining)\b",
            "Food",
        ),
        (
            r"\b(sports?|football|badminton|basketball|tournament|championship|athletes?)\b",
            "Sports",
        ),
        (
            r"\b(tech|technology|gadgets?|software|smartphones?|startups?)\b",
            "Technology",
        ),
        (
            r"\b(entertainment|movies?|films?|celebrity|celebrities|music|concerts?)\b",
            "Entertainment",
        ),
        (
            r"\b(politics|political|elections?|parliament|ministers?)\b",
            "Politics",
        ),
    ]
    .iter()
    .map(|(pattern, category)| (Regex::new(pattern).expect("keyword pattern"), *category))
    .collect()
});

/// Assign a category to an article title from a given publisher.
pub fn classify(title: &str, publisher: &str) -> &'static str {
    if let Some(category) = publisher_override(publisher) {
        return category;
    }

    let lowered = title.to_lowercase();
    for (pattern, category) in KEYWORD_RULES.iter() {
        if pattern.is_match(&lowered) {
            return category;
        }
    }

    DEFAULT_CATEGORY
}

/// Exact-name publisher overrides that bypass keyword matching entirely.
fn publisher_override(publisher: &str) -> Option<&'static str> {
    match publisher {
        // Single-topic food blog; every post is Food regardless of title
        "Eat Drink KL" => Some("Food"),
        _ => None,
    }
}
