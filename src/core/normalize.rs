//! Text normalization shared by the keyword engine and the feature extractor.
//!
//! - [`normalize`]: lowercase, drop everything that is not alphanumeric or
//!   whitespace (umlauts and other diacritics survive), collapse runs of
//!   whitespace to a single space. Idempotent.
//! - [`fold`]: lowercase and collapse whitespace but keep punctuation, so
//!   literal keyword terms such as `Guinea-Bissau` still match.

/// Full normalization used by the classifier path.
pub fn normalize(text: &str) -> String
{
    let lowered = text.to_lowercase();

    // Strip first, then rejoin so that removed punctuation never leaves
    // double spaces behind
    let stripped: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    collapse_whitespace(&stripped)
}

/// Case folding for literal substring matching.
pub fn fold(text: &str) -> String
{
    collapse_whitespace(&text.to_lowercase())
}

/// Normalized tokens, in order of appearance.
pub fn tokens(text: &str) -> Vec<String>
{
    normalize(text)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

fn collapse_whitespace(s: &str) -> String
{
    let mut out = String::with_capacity(s.len());

    for (i, word) in s
        .split_whitespace()
        .enumerate()
    {
        if i > 0
        {
            out.push(' ');
        }
        out.push_str(word);
    }

    out
}
