//! Shared plumbing for the narrate command-line tools: book loading with
//! encoding fallback and segmenter construction from a dictionary directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use libnarrate_core::{Config, DictSources, DictStore, Segmenter};

/// Read a book into memory: UTF-8 first, GB18030 with replacement on decode
/// error. Chinese novels in the wild come in both.
pub fn load_book<P: AsRef<Path>>(path: P) -> anyhow::Result<String> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).with_context(|| format!("open book {}", path.display()))?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            tracing::debug!(path = %path.display(), "not UTF-8, falling back to GB18030");
            let bytes = err.into_bytes();
            let (text, _, _) = encoding_rs::GB18030.decode(&bytes);
            Ok(text.into_owned())
        }
    }
}

/// A word injected on the command line: `WORD[:WEIGHT[:TAG]]`.
///
/// Weight defaults to 1000 and tag to `nr`, which is what pinning a
/// book-specific character name needs.
pub fn parse_added_word(arg: &str) -> anyhow::Result<(String, u32, String)> {
    let mut parts = arg.split(':');
    let word = parts
        .next()
        .filter(|w| !w.is_empty())
        .with_context(|| format!("empty word in {arg:?}"))?;
    let weight = match parts.next() {
        Some(w) => w
            .parse::<u32>()
            .with_context(|| format!("bad weight in {arg:?}"))?,
        None => 1000,
    };
    let tag = parts.next().unwrap_or("nr");
    Ok((word.to_string(), weight, tag.to_string()))
}

/// Build the dictionary store and segmenter from a dictionary directory,
/// injecting any command-line words before the store is shared.
pub fn build_segmenter(
    dict_dir: &Path,
    patterns: Option<&PathBuf>,
    added_words: &[String],
    config: &Config,
) -> anyhow::Result<(Arc<DictStore>, Segmenter)> {
    let sources = DictSources::from_dir(dict_dir);
    let mut store = DictStore::load(&sources, config)?;

    for arg in added_words {
        let (word, weight, tag) = parse_added_word(arg)?;
        tracing::debug!(%word, weight, %tag, "inject word");
        store.lexicon.insert_word(&word, weight, &tag);
    }

    let not_included = match patterns {
        Some(path) => Segmenter::load_not_included(&[path])?,
        None => {
            let default = dict_dir.join("not_included.txt");
            if default.exists() {
                Segmenter::load_not_included(&[default])?
            } else {
                None
            }
        }
    };

    let store = Arc::new(store);
    let segmenter = Segmenter::new(Arc::clone(&store), not_included, config);
    Ok((store, segmenter))
}

/// Default tracing setup for the tools: RUST_LOG-controlled, stderr.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn added_word_defaults() {
        let (word, weight, tag) = parse_added_word("日本人").unwrap();
        assert_eq!((word.as_str(), weight, tag.as_str()), ("日本人", 1000, "nr"));
        let (word, weight, tag) = parse_added_word("秦海:500:nr").unwrap();
        assert_eq!((word.as_str(), weight, tag.as_str()), ("秦海", 500, "nr"));
        assert!(parse_added_word(":5").is_err());
        assert!(parse_added_word("秦海:lots").is_err());
    }
}
