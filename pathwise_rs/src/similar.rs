//! "Did you mean" lookups.

use strsim::levenshtein;

/// Closest candidate within `max_distance` edits, compared case-insensitively.
/// Exact matches are not suggestions.
pub(crate) fn suggest_similar<'a, I>(input: &str, candidates: I, max_distance: usize) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let input_lower = input.to_lowercase();
    let mut best_match: Option<(&str, usize)> = None;

    for candidate in candidates {
        let distance = levenshtein(&input_lower, &candidate.to_lowercase());
        if distance == 0 || distance > max_distance {
            continue;
        }
        match best_match {
            Some((_, best)) if distance >= best => {}
            _ => best_match = Some((candidate, distance)),
        }
    }

    best_match.map(|(candidate, _)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggest_similar_picks_closest() {
        let labels = ["give", "gamemode", "ban"];
        assert_eq!(suggest_similar("gvie", labels, 2), Some("give"));
        assert_eq!(suggest_similar("BNA", labels, 2), Some("ban"));
        assert_eq!(suggest_similar("teleport", labels, 2), None);
        assert_eq!(suggest_similar("give", labels, 2), None);
    }
}
