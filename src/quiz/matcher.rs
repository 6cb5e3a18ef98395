use std::collections::HashSet;

// Share of the important words a partial answer must contain
const PARTIAL_MATCH_RATIO: f64 = 0.6;
// Words of this many characters or fewer are ignored by the partial match ("de", "la", "col")
const MAX_MINOR_WORD_LEN: usize = 3;

/// Lowercases, trims and folds the accents French structure names use most.
///
/// Only é, è, ê, à, ô and ç are folded; every other character is kept as is,
/// so "trapézoïde" becomes "trapezoïde".
pub fn normalize(answer: &str) -> String {
    answer
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'é' | 'è' | 'ê' => 'e',
            'à' => 'a',
            'ô' => 'o',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Lenient comparison of a typed answer with the expected structure name.
///
/// Accepted when both normalize to the same string, or when the answer contains at
/// least 60% of the important words (longer than three characters) of the expected
/// name, in any order and with any extra words.
pub fn matches(user_answer: &str, correct_answer: &str) -> bool {
    let user = normalize(user_answer);
    let correct = normalize(correct_answer);

    if user == correct {
        return true;
    }

    let user_words: HashSet<&str> = user.split_whitespace().collect();
    let important_words: HashSet<&str> = correct
        .split_whitespace()
        .filter(|w| w.chars().count() > MAX_MINOR_WORD_LEN)
        .collect();

    if important_words.is_empty() {
        return false;
    }

    let found = important_words
        .iter()
        .filter(|w| user_words.contains(*w))
        .count();
    found as f64 >= important_words.len() as f64 * PARTIAL_MATCH_RATIO
}
