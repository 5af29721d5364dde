//! Word limiter used to shorten free-form names.

/// Keep at most `num_words` words of at least `min_word_length` characters.
///
/// Splits on single spaces. Empty tokens (runs of spaces) stay in place,
/// shorter words are dropped, and the walk stops once `num_words` qualifying
/// words have been kept. A `num_words` of zero disables the limit.
pub fn limit_words(text: &str, num_words: usize, min_word_length: usize) -> String {
    let mut kept = Vec::new();
    let mut count = 0;

    for token in text.split(' ') {
        if token.is_empty() {
            kept.push(token);
            continue;
        }
        if token.chars().count() < min_word_length {
            continue;
        }
        kept.push(token);
        count += 1;
        if num_words != 0 && count == num_words {
            break;
        }
    }

    kept.join(" ")
}
