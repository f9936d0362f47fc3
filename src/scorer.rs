//! Abbreviation scoring
//!
//! Scores how well a typed abbreviation matches a candidate name. The
//! matcher looks for the longest leading run of the abbreviation that
//! occurs in the name, then recursively places the rest of the
//! abbreviation after that run. Skipping characters costs points, but
//! skipping to the start of a word is cheap.

use crate::element::Element;
use std::cmp::Ordering;

/// Score given to every candidate when nothing has been typed yet.
pub const EMPTY_ABBREVIATION_SCORE: f32 = 0.9;

/// Penalty per skipped letter when jumping to the start of a word.
const WORD_SKIP_PENALTY: f32 = 0.15;

/// Score `name` against `abbreviation`, returning a value in `[0, 1]`.
///
/// Matching is case-insensitive. An empty abbreviation scores
/// [`EMPTY_ABBREVIATION_SCORE`]; an abbreviation longer than the name
/// scores 0.
pub fn score(name: &str, abbreviation: &str) -> f32 {
    let name: Vec<char> = name.chars().collect();
    let abbreviation: Vec<char> = abbreviation.chars().collect();
    let folded: Vec<char> = name.iter().map(|c| fold(*c)).collect();
    let abbreviation: Vec<char> = abbreviation.iter().map(|c| fold(*c)).collect();

    score_in_range(&name, &folded, &abbreviation, 0, name.len())
}

/// Rank `candidates` against `abbreviation` by name.
///
/// The sort is stable, so equally scored candidates keep their relative
/// order. Everything from the first zero score onwards is dropped.
pub fn rank(candidates: Vec<Element>, abbreviation: &str) -> Vec<Element> {
    let mut scored: Vec<(f32, Element)> = candidates
        .into_iter()
        .map(|element| (score(&element.name, abbreviation), element))
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    scored
        .into_iter()
        .take_while(|(score, _)| *score > 0.0)
        .map(|(_, element)| element)
        .collect()
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Score the abbreviation against `name[start..start + len]`.
fn score_in_range(
    name: &[char],
    folded: &[char],
    abbreviation: &[char],
    start: usize,
    len: usize,
) -> f32 {
    if abbreviation.is_empty() {
        return EMPTY_ABBREVIATION_SCORE;
    }
    if abbreviation.len() > len {
        return 0.0;
    }

    let haystack = &folded[start..start + len];

    for prefix_len in (1..=abbreviation.len()).rev() {
        let prefix = &abbreviation[..prefix_len];
        let Some(offset) = find(haystack, prefix) else {
            continue;
        };
        let loc = start + offset;

        let remaining_start = loc + prefix_len;
        let remaining_len = start + len - remaining_start;
        let remaining_score = score_in_range(
            name,
            folded,
            &abbreviation[prefix_len..],
            remaining_start,
            remaining_len,
        );

        if remaining_score == 0.0 {
            continue;
        }

        let mut score = (remaining_start - start) as f32;
        if loc > start {
            score -= skip_penalty(name, start, loc);
        }
        score += remaining_score * remaining_len as f32;
        return score / len as f32;
    }

    0.0
}

/// Cost of skipping `name[start..loc]` to reach a match at `loc`.
fn skip_penalty(name: &[char], start: usize, loc: usize) -> f32 {
    if name[loc - 1].is_whitespace() {
        // Jumped to a word start: one point per earlier word boundary,
        // each other skipped character a fraction of one.
        name[start..loc - 1]
            .iter()
            .map(|c| if c.is_whitespace() { 1.0 } else { WORD_SKIP_PENALTY })
            .sum()
    } else if name[loc].is_uppercase() {
        name[start..loc]
            .iter()
            .map(|c| if c.is_uppercase() { 1.0 } else { WORD_SKIP_PENALTY })
            .sum()
    } else {
        (loc - start) as f32
    }
}

fn find(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, ElementKind};

    fn names(elements: &[Element]) -> Vec<&str> {
        elements.iter().map(|e| e.name.as_str()).collect()
    }

    fn items(names: &[&str]) -> Vec<Element> {
        names
            .iter()
            .map(|name| Element::new(*name, *name, ElementKind::Item))
            .collect()
    }

    #[test]
    fn test_empty_abbreviation_is_neutral() {
        assert_eq!(score("Calculator", ""), EMPTY_ABBREVIATION_SCORE);
        assert_eq!(score("", ""), EMPTY_ABBREVIATION_SCORE);
    }

    #[test]
    fn test_longer_abbreviation_scores_zero() {
        assert_eq!(score("ab", "abc"), 0.0);
        assert_eq!(score("", "a"), 0.0);
    }

    #[test]
    fn test_exact_match_scores_one() {
        assert!((score("firefox", "firefox") - 1.0).abs() < f32::EPSILON);
        assert!((score("Firefox", "FIREFOX") - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_prefix_match_values() {
        // 3 matched + 0.9 * 7 remaining over 10
        assert!((score("Calculator", "cal") - 0.93).abs() < 1e-5);
        assert!((score("Calendar", "cal") - 0.9375).abs() < 1e-5);
        assert!((score("Call Waiting", "cal") - 0.925).abs() < 1e-5);
    }

    #[test]
    fn test_word_start_is_cheaper_than_mid_word() {
        let word_start = score("Open Terminal", "t");
        let mid_word = score("Potato", "t");
        assert!(word_start > mid_word);
    }

    #[test]
    fn test_word_start_skip_charges_skipped_letters() {
        // "Open" skipped at 0.15 a letter, the space itself is free:
        // (6 - 0.6 + 0.9 * 7) / 13
        assert!((score("Open Terminal", "t") - 0.9).abs() < 1e-5);
        assert!(score("Open Terminal", "t") < score("Terminal", "t"));
        // One earlier boundary and six letters: (9 - 1.9 + 0.9 * 5) / 14
        assert!((score("Send To Mobile", "m") - 11.6 / 14.0).abs() < 1e-5);
    }

    #[test]
    fn test_camel_case_skip() {
        // Jumping to the capital W costs 0.15 per lowercase letter skipped
        // and 1 per capital skipped.
        let camel = score("callWaiting", "w");
        let flat = score("callwaiting", "w");
        assert!(camel > flat);
    }

    #[test]
    fn test_no_match_scores_zero() {
        assert_eq!(score("Calendar", "clw"), 0.0);
        assert_eq!(score("Calculator", "xyz"), 0.0);
    }

    #[test]
    fn test_rank_calendar_example() {
        let candidates = items(&["Calculator", "Calendar", "Call Waiting"]);

        let ranked = rank(candidates.clone(), "cal");
        assert_eq!(ranked.len(), 3);
        let pos = |name: &str| ranked.iter().position(|e| e.name == name).unwrap();
        assert!(pos("Calculator") < pos("Call Waiting"));
        assert!(pos("Calendar") < pos("Call Waiting"));

        let ranked = rank(candidates, "clw");
        assert_eq!(names(&ranked), vec!["Call Waiting"]);
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let candidates = items(&["beta", "alpha", "gamma"]);
        let ranked = rank(candidates, "");
        assert_eq!(names(&ranked), vec!["beta", "alpha", "gamma"]);
    }

    #[test]
    fn test_rank_drops_zero_scores() {
        let candidates = items(&["Terminal", "Text Editor", "Calculator"]);
        let ranked = rank(candidates, "te");
        assert!(!names(&ranked).contains(&"Calculator"));
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_non_ascii_names() {
        assert!(score("Über Café", "caf") > 0.0);
        assert!(score("ÜBER", "üb") > 0.0);
    }
}
