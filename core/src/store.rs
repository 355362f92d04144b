//! Dictionary store: the named dictionaries plus the compiled-cache layer.
//!
//! Loading a big general lexicon from text on every start is slow, so each
//! logical dictionary (which may be layered from several text files) is
//! compiled once and kept as a bincode blob under the cache directory. The
//! cache file is named by a digest of the comma-joined source path list; it
//! is used when it is at least as new as every source file, and rebuilt
//! otherwise. Writes go through a temp file and a rename, so two processes
//! racing to regenerate the same cache settle on last-writer-wins without
//! ever exposing a torn blob.

use anyhow::Context;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::dict::Dict;
use crate::Config;

/// Source files backing each logical dictionary.
///
/// A logical dictionary may layer several files into one map; the general
/// lexicon typically stacks a base word list with regions, organisations and
/// stop words.
#[derive(Debug, Clone, Default)]
pub struct DictSources {
    pub lexicon: Vec<PathBuf>,
    pub family: Vec<PathBuf>,
    pub given: Vec<PathBuf>,
    pub prefix: Vec<PathBuf>,
    pub suffix: Vec<PathBuf>,
    pub japanese: Vec<PathBuf>,
    pub english: Vec<PathBuf>,
}

impl DictSources {
    /// Conventional layout: every dictionary is one file under `dir`.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            lexicon: vec![dir.join("lexicon.dict")],
            family: vec![dir.join("family_names.dict")],
            given: vec![dir.join("given_names.dict")],
            prefix: vec![dir.join("name_prefixes.dict")],
            suffix: vec![dir.join("name_suffixes.dict")],
            japanese: vec![dir.join("japanese_names.dict")],
            english: vec![dir.join("english_names.dict")],
        }
    }
}

/// The loaded dictionaries, immutable for the process lifetime once built.
///
/// `lexicon` is the general dictionary whose total weight normalises the
/// segmenter's unigram scores; `family`/`given`/`prefix`/`suffix` feed the
/// name grammar; `japanese` and `english` are looked up directly by the
/// segmenter.
#[derive(Debug, Clone, Default)]
pub struct DictStore {
    pub lexicon: Dict,
    pub family: Dict,
    pub given: Dict,
    pub prefix: Dict,
    pub suffix: Dict,
    pub japanese: Dict,
    pub english: Dict,
}

impl DictStore {
    /// Load every logical dictionary, preferring fresh caches.
    ///
    /// A missing or malformed source file is fatal; a missing or stale cache
    /// is recovered by rebuilding.
    pub fn load(sources: &DictSources, config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            lexicon: load_cached(&sources.lexicon, &config.cache_dir)?,
            family: load_cached(&sources.family, &config.cache_dir)?,
            given: load_cached(&sources.given, &config.cache_dir)?,
            prefix: load_cached(&sources.prefix, &config.cache_dir)?,
            suffix: load_cached(&sources.suffix, &config.cache_dir)?,
            japanese: load_cached(&sources.japanese, &config.cache_dir)?,
            english: load_cached(&sources.english, &config.cache_dir)?,
        })
    }

    /// Name grammar over this store's four name-slot dictionaries.
    pub fn name_grammar(&self, weight_floor: u32) -> crate::NameGrammar<'_> {
        crate::NameGrammar::new(&self.prefix, &self.family, &self.given, &self.suffix, weight_floor)
    }
}

/// Cache file path for a source list: hex digest of the comma-joined paths.
pub fn cache_path(paths: &[PathBuf], cache_dir: &Path) -> PathBuf {
    let joined = paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(",");
    let digest = Sha256::digest(joined.as_bytes());
    let mut name = String::with_capacity(digest.len() * 2 + 5);
    for byte in digest {
        name.push_str(&format!("{:02x}", byte));
    }
    name.push_str(".dict");
    cache_dir.join(name)
}

fn newest_source_mtime(paths: &[PathBuf]) -> anyhow::Result<SystemTime> {
    let mut newest = SystemTime::UNIX_EPOCH;
    for path in paths {
        let meta = std::fs::metadata(path)
            .with_context(|| format!("stat dict source {}", path.display()))?;
        let mtime = meta.modified()?;
        if mtime > newest {
            newest = mtime;
        }
    }
    Ok(newest)
}

/// Load one logical dictionary, via the cache when it is fresh.
pub fn load_cached(paths: &[PathBuf], cache_dir: &Path) -> anyhow::Result<Dict> {
    let cache = cache_path(paths, cache_dir);
    let sources_mtime = newest_source_mtime(paths)?;

    if let Ok(meta) = std::fs::metadata(&cache) {
        let fresh = meta.modified().map(|m| m >= sources_mtime).unwrap_or(false);
        if fresh {
            match Dict::load_bincode(&cache) {
                Ok(dict) => {
                    tracing::debug!(cache = %cache.display(), size = dict.len(), "dict cache hit");
                    return Ok(dict);
                }
                Err(err) => {
                    tracing::warn!(cache = %cache.display(), %err, "dict cache unreadable, rebuilding");
                }
            }
        }
    }

    let dict = Dict::load_paths(paths)?;
    if let Err(err) = write_cache(&dict, &cache, cache_dir) {
        // A cache that cannot be written only costs the next start-up time.
        tracing::warn!(cache = %cache.display(), %err, "dict cache write failed");
    }
    Ok(dict)
}

fn write_cache(dict: &Dict, cache: &Path, cache_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(cache_dir)
        .with_context(|| format!("create cache dir {}", cache_dir.display()))?;
    let tmp = cache.with_extension(format!("tmp.{}", std::process::id()));
    dict.save_bincode(&tmp)?;
    std::fs::rename(&tmp, cache)
        .with_context(|| format!("publish cache {}", cache.display()))?;
    tracing::debug!(cache = %cache.display(), "dict cache written");
    Ok(())
}
