//! Naive whitespace tokenizer for the attention playground.
//!
//! Not a linguistic tokenizer: it only separates a small set of punctuation
//! marks and splits on whitespace, so the same input always yields the same
//! token sequence.

/// Punctuation characters split into standalone tokens.
pub const SPLIT_PUNCTUATION: [char; 6] = ['.', ',', '!', '?', ';', ':'];

/// Tokenize `text`, optionally separating punctuation into its own tokens.
///
/// With `split_punctuation` enabled, every character in [`SPLIT_PUNCTUATION`]
/// is surrounded by spaces before splitting, so `"dog."` becomes `["dog", "."]`.
/// Empty tokens are discarded.
pub fn tokenize(text: &str, split_punctuation: bool) -> Vec<String> {
    if !split_punctuation {
        return text.split_whitespace().map(String::from).collect();
    }

    let mut spaced = String::with_capacity(text.len() + text.len() / 4);
    for ch in text.chars() {
        if SPLIT_PUNCTUATION.contains(&ch) {
            spaced.push(' ');
            spaced.push(ch);
            spaced.push(' ');
        } else {
            spaced.push(ch);
        }
    }
    spaced.split_whitespace().map(String::from).collect()
}
