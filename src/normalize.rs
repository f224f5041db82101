/// Canonical display form of a free-typed exercise name.
///
/// Every whitespace-separated word is lower-cased and its first letter
/// upper-cased, then the words are joined with single spaces:
/// `"  pull   UPS "` becomes `"Pull Ups"`.
#[must_use]
pub fn normalize_exercise_name(raw: &str) -> String {
    raw.split_whitespace()
        .map(capitalize_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize_word(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
