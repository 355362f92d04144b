//! Weighted prefix dictionary.
//!
//! A `Dict` maps a word to a `(weight, tag)` pair. Weight 0 marks a
//! *prefix-only* entry: it exists so that an incremental scan over a sentence
//! can tell "no word starts like this" apart from "keep reading". Every
//! strict prefix of every terminal is synthesised as a weight-0 entry at
//! insert time, which is what lets the segmenter's DAG construction stop
//! scanning as soon as a fragment is absent from the map.
//!
//! The on-disk text format is one record per line, `WORD [WEIGHT [POS]]`,
//! with `#` comments and blank lines ignored. Missing weight defaults to 1,
//! missing POS to the empty string.
//!
//! Public API:
//! - `Dict` - load/insert/lookup plus bincode (de)serialization helpers
//! - `DictEntry` - `(weight, tag)` payload
//! - `Lookup` - tri-state probe result used by the DAG scan

use ahash::AHashMap;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

/// Payload of a dictionary entry.
///
/// `weight == 0` means the entry only exists to keep prefix scans alive;
/// `weight > 0` is a real word. `tag` is the POS tag from the source file
/// (`nr` personal name, `n` common noun, ...), empty when the file omitted
/// it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictEntry {
    pub weight: u32,
    pub tag: String,
}

/// Result of probing a fragment against a `Dict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// The fragment is not in the map: no word starts with it.
    Miss,
    /// Prefix-only entry: some longer word starts with this fragment.
    Prefix,
    /// Terminal word with its payload.
    Word(&'a DictEntry),
}

/// In-memory weighted prefix dictionary.
///
/// The total terminal weight is memoised on insert; the general dictionary's
/// total is the normaliser of the segmenter's unigram log-probability.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dict {
    map: AHashMap<String, DictEntry>,
    total_weight: u64,
}

impl Dict {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self {
            map: AHashMap::new(),
            total_weight: 0,
        }
    }

    /// Insert a terminal word and synthesise its prefix closure.
    ///
    /// The word is NFC-normalised. A weight-0 insert only guarantees the
    /// prefix entry exists. When the word is already present as a terminal
    /// the higher weight wins; an explicit terminal always replaces a
    /// prefix-only entry.
    pub fn insert_word<W: AsRef<str>, T: Into<String>>(&mut self, word: W, weight: u32, tag: T) {
        let word: String = word.as_ref().nfc().collect();
        if word.is_empty() {
            return;
        }

        // Prefix closure over scalar values, never bytes.
        for (idx, _) in word.char_indices().skip(1) {
            let frag = &word[..idx];
            if !self.map.contains_key(frag) {
                self.map.insert(
                    frag.to_string(),
                    DictEntry {
                        weight: 0,
                        tag: String::new(),
                    },
                );
            }
        }

        if weight == 0 {
            self.map.entry(word).or_insert(DictEntry {
                weight: 0,
                tag: String::new(),
            });
            return;
        }

        use std::collections::hash_map::Entry;
        match self.map.entry(word) {
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();
                if weight > entry.weight {
                    self.total_weight += u64::from(weight) - u64::from(entry.weight);
                    entry.weight = weight;
                    entry.tag = tag.into();
                }
            }
            Entry::Vacant(slot) => {
                self.total_weight += u64::from(weight);
                slot.insert(DictEntry {
                    weight,
                    tag: tag.into(),
                });
            }
        }
    }

    /// Probe a fragment.
    pub fn lookup(&self, frag: &str) -> Lookup<'_> {
        match self.map.get(frag) {
            None => Lookup::Miss,
            Some(entry) if entry.weight == 0 => Lookup::Prefix,
            Some(entry) => Lookup::Word(entry),
        }
    }

    /// Terminal weight of a word, or `None` when absent or prefix-only.
    pub fn terminal_weight(&self, word: &str) -> Option<u32> {
        match self.map.get(word) {
            Some(entry) if entry.weight > 0 => Some(entry.weight),
            _ => None,
        }
    }

    /// True if the word exists as a terminal (weight > 0).
    pub fn contains_terminal(&self, word: &str) -> bool {
        self.terminal_weight(word).is_some()
    }

    /// True if the fragment exists at all (terminal or prefix-only).
    pub fn contains_fragment(&self, frag: &str) -> bool {
        self.map.contains_key(frag)
    }

    /// Memoised sum of all terminal weights.
    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// Number of entries, prefix-only entries included.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True if the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over all entries, prefix-only entries included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DictEntry)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parse dictionary text into this map.
    ///
    /// `source` names the origin for error messages (a path, or "<inline>").
    pub fn load_text(&mut self, text: &str, source: &str) -> anyhow::Result<()> {
        for (line_no, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.split_whitespace();
            let word = match parts.next() {
                Some(w) => w,
                None => continue,
            };
            let weight = match parts.next() {
                Some(field) => field.parse::<u32>().with_context(|| {
                    format!("{}:{}: bad weight {:?}", source, line_no + 1, field)
                })?,
                None => 1,
            };
            let tag = parts.next().unwrap_or("");
            if parts.next().is_some() {
                bail!("{}:{}: trailing fields in {:?}", source, line_no + 1, line);
            }

            self.insert_word(word, weight, tag);
        }
        Ok(())
    }

    /// Build a dictionary from inline text (tests and tools).
    pub fn from_text(text: &str) -> anyhow::Result<Self> {
        let mut dict = Dict::new();
        dict.load_text(text, "<inline>")?;
        Ok(dict)
    }

    /// Load one logical dictionary from a list of files layered into one map.
    pub fn load_paths<P: AsRef<Path>>(paths: &[P]) -> anyhow::Result<Self> {
        let mut dict = Dict::new();
        for path in paths {
            let path = path.as_ref();
            tracing::debug!(path = %path.display(), "load dict");
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("open dict {}", path.display()))?;
            dict.load_text(&text, &path.display().to_string())?;
            tracing::debug!(path = %path.display(), size = dict.len(), "load dict done");
        }
        Ok(dict)
    }

    /// Save the dictionary to a file using bincode serialization.
    pub fn save_bincode<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    /// Load the dictionary from a bincode file produced by `save_bincode`.
    pub fn load_bincode<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let dict: Self = bincode::deserialize_from(reader)?;
        Ok(dict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_builds_prefix_closure() {
        let mut dict = Dict::new();
        dict.insert_word("材料帝国", 5, "n");
        assert_eq!(dict.lookup("材"), Lookup::Prefix);
        assert_eq!(dict.lookup("材料"), Lookup::Prefix);
        assert_eq!(dict.lookup("材料帝"), Lookup::Prefix);
        assert!(dict.contains_terminal("材料帝国"));
        assert_eq!(dict.lookup("帝国"), Lookup::Miss);
    }

    #[test]
    fn terminal_promotes_prefix_entry() {
        let mut dict = Dict::new();
        dict.insert_word("你好吗", 1, "");
        assert_eq!(dict.lookup("你好"), Lookup::Prefix);
        dict.insert_word("你好", 3, "n");
        assert_eq!(dict.terminal_weight("你好"), Some(3));
        assert_eq!(dict.total_weight(), 4);
    }

    #[test]
    fn duplicate_keeps_higher_weight() {
        let mut dict = Dict::new();
        dict.insert_word("秦海", 10, "nr");
        dict.insert_word("秦海", 2, "n");
        assert_eq!(dict.terminal_weight("秦海"), Some(10));
        assert_eq!(dict.total_weight(), 10);
        dict.insert_word("秦海", 20, "nr");
        assert_eq!(dict.terminal_weight("秦海"), Some(20));
        assert_eq!(dict.total_weight(), 20);
    }

    #[test]
    fn text_format_defaults_and_comments() {
        let dict = Dict::from_text(
            "# comment line\n\
             秦海 100 nr\n\
             \n\
             安排 3\n\
             去做\n",
        )
        .unwrap();
        let entry = match dict.lookup("秦海") {
            Lookup::Word(e) => e,
            other => panic!("expected word, got {:?}", other),
        };
        assert_eq!(entry.weight, 100);
        assert_eq!(entry.tag, "nr");
        assert_eq!(dict.terminal_weight("安排"), Some(3));
        assert_eq!(dict.terminal_weight("去做"), Some(1));
        assert_eq!(dict.total_weight(), 104);
    }

    #[test]
    fn malformed_weight_is_an_error() {
        let err = Dict::from_text("秦海 lots nr\n").unwrap_err();
        assert!(err.to_string().contains("bad weight"));
    }

    #[test]
    fn every_terminal_has_its_prefixes() {
        let dict = Dict::from_text("冷科长 4 nr\n王晓晨 2 nr\n日本人 1000 nr\n").unwrap();
        for (word, entry) in dict.iter() {
            if entry.weight == 0 {
                continue;
            }
            let chars: Vec<char> = word.chars().collect();
            for end in 1..chars.len() {
                let frag: String = chars[..end].iter().collect();
                assert!(
                    dict.contains_fragment(&frag),
                    "missing prefix {:?} of {:?}",
                    frag,
                    word
                );
            }
        }
    }

    #[test]
    fn save_and_load_bincode_roundtrip() {
        let tmp = std::env::temp_dir().join("libnarrate_dict_test.bin");
        let mut dict = Dict::new();
        dict.insert_word("甲乙", 5, "n");
        dict.insert_word("丙", 2, "");
        dict.save_bincode(&tmp).unwrap();
        let loaded = Dict::load_bincode(&tmp).unwrap();
        assert_eq!(loaded.len(), dict.len());
        assert_eq!(loaded.terminal_weight("甲乙"), Some(5));
        assert_eq!(loaded.total_weight(), 7);
        let _ = std::fs::remove_file(tmp);
    }
}
