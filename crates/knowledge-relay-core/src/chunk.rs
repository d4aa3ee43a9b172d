//! Fixed-size word-window chunker.
//!
//! Splits document text on whitespace and groups the words into consecutive
//! windows of `size` words. Each window is joined with single spaces to form
//! one chunk; the final window may be shorter.
//!
//! # Example
//!
//! ```rust
//! use std::num::NonZeroUsize;
//! use knowledge_relay_core::chunk::chunk_words;
//!
//! let size = NonZeroUsize::new(2).unwrap();
//! let chunks = chunk_words("one two\nthree  four five", size);
//! assert_eq!(chunks, vec!["one two", "three four", "five"]);
//! ```

use std::num::NonZeroUsize;

/// Default number of words per chunk.
pub const DEFAULT_CHUNK_SIZE: NonZeroUsize = match NonZeroUsize::new(500) {
    Some(n) => n,
    None => unreachable!(),
};

/// Word boundary: Unicode whitespace plus the ASCII information separators
/// U+001C..=U+001F, which `char::is_whitespace` does not include.
fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Iterate over the non-empty words of `text`.
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(is_separator).filter(|w| !w.is_empty())
}

/// Split text into chunks of at most `size` whitespace-separated words.
///
/// Returns an empty vector when `text` contains no words. Chunk order equals
/// position-in-document order.
pub fn chunk_words(text: &str, size: NonZeroUsize) -> Vec<String> {
    let words: Vec<&str> = words(text).collect();
    words.chunks(size.get()).map(|window| window.join(" ")).collect()
}
