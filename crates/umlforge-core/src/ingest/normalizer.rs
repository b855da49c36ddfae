use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("Text is empty after cleaning")]
    Empty,
}

pub type NormalizationResult<T> = Result<T, NormalizationError>;

/// Punctuation that survives cleaning.
pub const PUNCTUATION_ALLOW_LIST: &[char] = &[
    '.', ',', ';', ':', '!', '?', '\'', '"', '(', ')', '[', ']', '{', '}', '-', '_', '/', '&',
    '%', '$', '#', '@', '+', '*', '=', '<', '>',
];

const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?'];

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static SPACE_BEFORE_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([,.;:!?])").unwrap());
static MISSING_SPACE_AFTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([,;:!?])([A-Za-z])").unwrap());
static MISSING_SPACE_AFTER_PERIOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z]{2,}\.)([A-Z])").unwrap());

pub trait Normalizer: Send + Sync {
    fn normalize(&self, text: &str) -> NormalizationResult<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNormalizer;

impl DefaultNormalizer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Normalizer for DefaultNormalizer {
    fn normalize(&self, text: &str) -> NormalizationResult<String> {
        let mut cleaned = String::with_capacity(text.len());
        for ch in text.chars() {
            match ch {
                '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' | '`' | '\u{00B4}' => {
                    cleaned.push('\'');
                }
                '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' | '\u{00AB}'
                | '\u{00BB}' => cleaned.push('"'),
                '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
                | '\u{2212}' => cleaned.push('-'),
                '\u{2026}' => cleaned.push_str("..."),
                c if c.is_whitespace() => cleaned.push(' '),
                c if c.is_alphanumeric() || PUNCTUATION_ALLOW_LIST.contains(&c) => cleaned.push(c),
                _ => {}
            }
        }

        let collapsed = WHITESPACE.replace_all(&cleaned, " ");
        let tightened = SPACE_BEFORE_PUNCTUATION.replace_all(&collapsed, "${1}");
        let spaced = MISSING_SPACE_AFTER.replace_all(&tightened, "${1} ${2}");
        let spaced = MISSING_SPACE_AFTER_PERIOD.replace_all(&spaced, "${1} ${2}");

        let result = spaced.trim();
        if result.is_empty() {
            return Err(NormalizationError::Empty);
        }
        Ok(result.to_string())
    }
}

/// A window of normalized text handed to a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub index: usize,
    /// Byte offset of `text` within the source.
    pub offset: usize,
    pub text: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSettings {
    pub threshold: usize,
    pub max_len: usize,
    pub overlap: usize,
}

impl ChunkSettings {
    #[must_use]
    pub const fn new(threshold: usize, max_len: usize, overlap: usize) -> Self {
        Self {
            threshold,
            max_len,
            overlap,
        }
    }

    /// Texts at or below the threshold come back as a single chunk.
    pub fn chunks<'a>(&self, text: &'a str) -> Chunks<'a> {
        if text.len() <= self.threshold {
            Chunks::new(text, usize::MAX, 0)
        } else {
            Chunks::new(text, self.max_len, self.overlap)
        }
    }
}

/// Lazy chunk iterator. Clone it to restart from the same position.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    max_len: usize,
    overlap: usize,
    position: usize,
    index: usize,
    done: bool,
}

impl<'a> Chunks<'a> {
    pub fn new(text: &'a str, max_len: usize, overlap: usize) -> Self {
        Self {
            text,
            max_len: max_len.max(1),
            overlap,
            position: 0,
            index: 0,
            done: text.is_empty(),
        }
    }

    fn cut_point(&self, start: usize) -> usize {
        let mut hard = floor_char_boundary(self.text, start + self.max_len);
        if hard <= start {
            hard = ceil_char_boundary(self.text, start + 1);
        }
        let tail_start = floor_char_boundary(self.text, start + self.max_len * 7 / 10).max(start);
        if tail_start >= hard {
            return hard;
        }
        self.text[tail_start..hard]
            .rfind(SENTENCE_TERMINATORS)
            .map_or(hard, |i| tail_start + i + 1)
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let len = self.text.len();
        let start = self.position;
        let end = if start.saturating_add(self.max_len) >= len {
            len
        } else {
            self.cut_point(start)
        };

        let chunk = Chunk {
            index: self.index,
            offset: start,
            text: &self.text[start..end],
        };
        self.index += 1;

        if end >= len {
            self.done = true;
        } else {
            let next = floor_char_boundary(self.text, end.saturating_sub(self.overlap));
            self.position = if next > start { next } else { end };
        }
        Some(chunk)
    }
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut i = index;
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut i = index;
    while !text.is_char_boundary(i) {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(text: &str) -> String {
        DefaultNormalizer::new().normalize(text).unwrap()
    }

    #[test]
    fn test_quotes_dashes_and_ellipsis() {
        assert_eq!(
            normalize("\u{201C}Order\u{201D} isn\u{2019}t \u{2014} done\u{2026}"),
            "\"Order\" isn't - done..."
        );
    }

    #[test]
    fn test_whitespace_and_punctuation_spacing() {
        assert_eq!(
            normalize("A  User\thas an Account ,which\nholds money;it is safe"),
            "A User has an Account, which holds money; it is safe"
        );
        assert_eq!(normalize("Orders ship.Customers pay."), "Orders ship. Customers pay.");
    }

    #[test]
    fn test_non_printable_stripped() {
        assert_eq!(normalize("Order\u{0007} Item \u{2603}"), "Order Item");
    }

    #[test]
    fn test_empty_after_cleaning() {
        let err = DefaultNormalizer::new().normalize("\u{0007}\u{2603}  ").unwrap_err();
        assert_eq!(err, NormalizationError::Empty);
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let settings = ChunkSettings::new(2000, 1500, 100);
        let chunks: Vec<_> = settings.chunks("A short text.").collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].offset, 0);
    }

    #[test]
    fn test_chunks_prefer_sentence_boundaries_and_overlap() {
        let sentence = "The customer places an order. ";
        let text = sentence.repeat(10);
        let settings = ChunkSettings::new(100, 100, 10);
        let chunks: Vec<_> = settings.chunks(&text).collect();

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert!(chunk.text.len() <= 100);
        }
        assert!(chunks[0].text.ends_with('.'));
        assert!(chunks[1].offset < chunks[0].text.len());
        assert_eq!(chunks.last().unwrap().offset + chunks.last().unwrap().text.len(), text.len());
    }

    #[test]
    fn test_chunks_respect_char_boundaries() {
        let text = "é".repeat(50);
        let chunks: Vec<_> = Chunks::new(&text, 7, 2).collect();
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.text.chars().all(|c| c == 'é'));
        }
    }

    #[test]
    fn test_chunks_are_restartable() {
        let text = "word ".repeat(100);
        let chunks = Chunks::new(&text, 64, 8);
        let first: Vec<_> = chunks.clone().collect();
        let second: Vec<_> = chunks.collect();
        assert_eq!(first, second);
    }
}
