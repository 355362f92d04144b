//! libnarrate-core
//!
//! Dictionary store, DAG-based word segmenter and book-scale name extraction
//! shared by the narrate crates (dialogue attribution, command-line tools).
//!
//! This crate provides the text-analysis half of the pipeline: weighted
//! prefix dictionaries with a bincode cache, a unigram best-path segmenter
//! that also recognises personal names through a compositional grammar, and
//! the extractor that aggregates those names over a whole book.
//!
//! Public API:
//! - `Dict` / `DictEntry` - weighted prefix dictionary with text-file loader
//! - `DictStore` / `DictSources` - the named dictionaries plus cache layer
//! - `NameGrammar` - compositional Chinese-name matcher
//! - `Segmenter` / `Token` - sentence segmentation with POS tags
//! - `NameTally` - book-level name aggregation and reconciliation
//! - `Config` - configuration with TOML load/save helpers

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod dict;
pub use dict::{Dict, DictEntry, Lookup};

pub mod store;
pub use store::{DictSources, DictStore};

pub mod names;
pub use names::NameGrammar;

pub mod segment;
pub use segment::{Segmenter, Token};

pub mod extract;
pub use extract::NameTally;

/// POS tag carried by personal-name tokens. The only tag the analysis
/// pipeline treats specially.
pub const NAME_TAG: &str = "nr";

/// Configuration for the analysis core.
///
/// Only knobs that change observable behaviour live here; dictionary file
/// locations belong to `DictSources` because they describe inputs, not
/// behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Directory for compiled dictionary caches.
    pub cache_dir: PathBuf,

    /// Capacity of the per-segmenter clip decode cache.
    pub decode_cache_size: usize,

    /// Minimum character length of a tallied or scanned name.
    pub min_name_len: usize,
    /// Maximum character length of a tallied or scanned name.
    pub max_name_len: usize,

    /// A matched name never scores below this weight, so names can outbid
    /// common nouns in the best-path decode.
    pub name_weight_floor: u32,

    /// Reconciliation ratio: a long candidate collapses into a substring
    /// whose count * ratio still exceeds the candidate's count.
    pub reconcile_ratio: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("tmp"),
            decode_cache_size: 1000,
            min_name_len: 2,
            max_name_len: 6,
            name_weight_floor: 10,
            reconcile_ratio: 0.2,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Utility helpers.
pub mod utils {
    /// Normalize input strings (NFC) and trim whitespace.
    pub fn normalize(s: &str) -> String {
        use unicode_normalization::UnicodeNormalization;
        s.nfc().collect::<String>().trim().to_string()
    }

    /// True for a CJK unified ideograph (U+4E00..=U+9FD5).
    pub fn is_han(ch: char) -> bool {
        ('\u{4E00}'..='\u{9FD5}').contains(&ch)
    }

    /// True for the ASCII word class the segmenter keeps together:
    /// letters, digits, underscore and hyphen.
    pub fn is_ascii_word(ch: char) -> bool {
        ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
    }

    /// True for characters that can end a "word" context: an ideograph or an
    /// ASCII alphanumeric. Quote merging keys off this class.
    pub fn is_word_char(ch: char) -> bool {
        is_han(ch) || ch.is_ascii_alphanumeric()
    }
}
