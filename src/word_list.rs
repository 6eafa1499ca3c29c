//! Interned word lists. Every distinct word gets a `WordId` and every distinct character a
//! `GlyphId`, so the solver can compare letters by index instead of decoding strings.

use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::Path;

use crate::MAX_SLOT_LENGTH;

/// An identifier for a given letter or symbol, based on its index in the `WordList`'s `glyphs`
/// field.
pub type GlyphId = usize;

/// An identifier for a given word, based on its index in the `WordList`'s `words` field.
pub type WordId = usize;

/// A word that can be chosen for a slot.
#[derive(Debug, Clone)]
pub struct Word {
    pub string: String,
    pub glyphs: SmallVec<[GlyphId; MAX_SLOT_LENGTH]>,
}

impl Word {
    /// Length in characters, which is what slot lengths are measured in.
    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WordListError {
    #[error("couldn't read word list '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// The set of candidate words for a fill, deduplicated and interned.
#[derive(Clone, Default)]
pub struct WordList {
    pub glyphs: Vec<char>,
    pub words: Vec<Word>,
    pub word_id_by_string: HashMap<String, WordId>,
    glyph_id_by_char: HashMap<char, GlyphId>,
}

impl Debug for WordList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordList")
            .field("glyphs", &self.glyphs)
            .field("words", &format!("({} entries)", self.words.len()))
            .finish()
    }
}

impl WordList {
    /// Build a word list from the given strings. Words are kept exactly as given; duplicates and
    /// empty strings are dropped. Ids follow first-occurrence order.
    pub fn new<I, S>(words: I) -> WordList
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut word_list = WordList::default();
        for word in words {
            word_list.add_word(word.as_ref());
        }
        word_list
    }

    /// Add a word if it isn't already present, returning its id either way. Returns `None` for
    /// the empty string.
    pub fn add_word(&mut self, word: &str) -> Option<WordId> {
        if word.is_empty() {
            return None;
        }
        if let Some(&word_id) = self.word_id_by_string.get(word) {
            return Some(word_id);
        }

        let glyphs = word.chars().map(|c| self.glyph_id(c)).collect();
        let word_id = self.words.len();
        self.words.push(Word {
            string: word.to_string(),
            glyphs,
        });
        self.word_id_by_string.insert(word.to_string(), word_id);

        Some(word_id)
    }

    fn glyph_id(&mut self, c: char) -> GlyphId {
        if let Some(&glyph_id) = self.glyph_id_by_char.get(&c) {
            return glyph_id;
        }
        let glyph_id = self.glyphs.len();
        self.glyphs.push(c);
        self.glyph_id_by_char.insert(c, glyph_id);
        glyph_id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    #[must_use]
    pub fn get(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }

    #[must_use]
    pub fn word_id(&self, word: &str) -> Option<WordId> {
        self.word_id_by_string.get(word).copied()
    }
}

/// Parse the contents of a word list file: one word per line, upper-cased, with an optional
/// `;score` or `,score` suffix ignored.
#[must_use]
pub fn parse_word_list(contents: &str) -> WordList {
    WordList::new(contents.lines().filter_map(|line| {
        let word = line.split(|c: char| c == ';' || c == ',').next().unwrap_or("").trim();
        if word.is_empty() {
            None
        } else {
            Some(word.to_uppercase())
        }
    }))
}

/// Load a word list file from disk.
pub fn load_word_list<P: AsRef<Path>>(path: P) -> Result<WordList, WordListError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| WordListError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let word_list = parse_word_list(&contents);
    log::debug!("Loaded {} words from {}", word_list.len(), path.display());

    Ok(word_list)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_share_an_id() {
        let word_list = WordList::new(["CAT", "DOG", "CAT"]);

        assert_eq!(word_list.len(), 2);
        assert_eq!(word_list.word_id("CAT"), Some(0));
        assert_eq!(word_list.word_id("DOG"), Some(1));
    }

    #[test]
    fn test_glyphs_are_interned() {
        let word_list = WordList::new(["CAT", "ACT"]);

        assert_eq!(word_list.glyphs, vec!['C', 'A', 'T']);
        assert_eq!(word_list.get(1).glyphs.as_slice(), &[1, 0, 2]);
    }

    #[test]
    fn test_words_are_not_normalized() {
        let word_list = WordList::new(["cat", "CAT", ""]);

        assert_eq!(word_list.len(), 2);
        assert!(word_list.word_id("cat").is_some());
    }

    #[test]
    fn test_length_counts_chars() {
        let word_list = WordList::new(["CAFÉ"]);

        assert_eq!(word_list.get(0).len(), 4);
    }

    #[test]
    fn test_parse_word_list() {
        let word_list = parse_word_list("cat\n\n  dog  \nbird;50\nemu,20\n");

        let strings: Vec<_> = word_list.words.iter().map(|w| w.string.as_str()).collect();
        assert_eq!(strings, vec!["CAT", "DOG", "BIRD", "EMU"]);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = load_word_list("/nonexistent/crossfill/words.txt");

        assert!(matches!(result, Err(WordListError::Io { .. })));
    }
}
