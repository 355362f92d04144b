//! DAG-based word segmenter.
//!
//! A sentence is first sliced into runs of CJK ideographs, runs of ASCII
//! word characters, and everything else. ASCII runs pass through as one
//! `eng` token, other non-CJK text as `sym`; each CJK run goes through the
//! dictionary decode:
//!
//! 1. Build a DAG over scalar-value positions: an edge `(end, weight, tag)`
//!    for every span that is a terminal in the general dictionary, the name
//!    grammar, or the Japanese/English name dictionaries, plus a weight-0
//!    single-character fallback. The scan from a start position stops as
//!    soon as no dictionary reports even a prefix, which is what keeps DAG
//!    construction near-linear in practice.
//! 2. Decode right to left with the unigram cost
//!    `log(max(w, 1)) - log(total)`, accumulating the classical Viterbi
//!    recurrence; ties go to the longer span.
//! 3. Emit the chosen spans. Positions decoded through the fallback edge are
//!    bonded into a buffer and re-split by the configurable not-included
//!    alternation, so digit runs and list markers come out as their own
//!    tokens instead of one unreadable clump.
//!
//! Decoded clips are memoised in an LRU cache: dialogue-heavy prose repeats
//! short clips constantly.

use lru::LruCache;
use regex::Regex;
use std::cell::RefCell;
use std::path::Path;
use std::sync::Arc;

use crate::store::DictStore;
use crate::utils;
use crate::Config;
use crate::{dict::Lookup, NAME_TAG};

/// One emitted token: the text span and its POS tag.
///
/// Tags: dictionary words carry their file tag (possibly empty), name
/// matches carry `nr`, ASCII runs `eng`, other passthrough `sym`, bonded
/// leftovers `x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub tag: String,
}

impl Token {
    pub fn new<T: Into<String>, G: Into<String>>(text: T, tag: G) -> Self {
        Self {
            text: text.into(),
            tag: tag.into(),
        }
    }
}

/// A DAG edge out of some start position; `end` is inclusive.
#[derive(Debug, Clone)]
struct Edge {
    end: usize,
    weight: u32,
    tag: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Han,
    Ascii,
    Other,
}

fn classify(ch: char) -> BlockKind {
    if utils::is_han(ch) {
        BlockKind::Han
    } else if utils::is_ascii_word(ch) {
        BlockKind::Ascii
    } else {
        BlockKind::Other
    }
}

/// Slice text into maximal same-class runs. Concatenating the runs
/// reproduces the input exactly.
fn split_blocks(text: &str) -> Vec<(BlockKind, &str)> {
    let mut blocks = Vec::new();
    let mut start = 0;
    let mut kind: Option<BlockKind> = None;
    for (idx, ch) in text.char_indices() {
        let k = classify(ch);
        match kind {
            Some(prev) if prev == k => {}
            Some(prev) => {
                blocks.push((prev, &text[start..idx]));
                start = idx;
                kind = Some(k);
            }
            None => kind = Some(k),
        }
    }
    if let Some(prev) = kind {
        blocks.push((prev, &text[start..]));
    }
    blocks
}

/// Split `text` on `re`, keeping the separators as pieces.
fn split_keep<'t>(re: &Regex, text: &'t str) -> Vec<&'t str> {
    let mut out = Vec::new();
    let mut last = 0;
    for m in re.find_iter(text) {
        if m.start() > last {
            out.push(&text[last..m.start()]);
        }
        if !m.as_str().is_empty() {
            out.push(m.as_str());
        }
        last = m.end().max(last);
    }
    if last < text.len() {
        out.push(&text[last..]);
    }
    out
}

/// The segmenter. Pure over an immutable `DictStore`; the DAG and route of
/// a decode live on the call stack, so concurrent owners of separate
/// segmenters never share mutable state.
pub struct Segmenter {
    store: Arc<DictStore>,
    not_included: Option<Regex>,
    weight_floor: u32,
    log_total: f64,
    cache: RefCell<LruCache<String, Vec<Token>>>,
}

impl Segmenter {
    pub fn new(store: Arc<DictStore>, not_included: Option<Regex>, config: &Config) -> Self {
        let log_total = (store.lexicon.total_weight().max(1) as f64).ln();
        Self {
            store,
            not_included,
            weight_floor: config.name_weight_floor,
            log_total,
            cache: RefCell::new(LruCache::new(
                std::num::NonZeroUsize::new(config.decode_cache_size)
                    .unwrap_or(std::num::NonZeroUsize::new(1000).unwrap()),
            )),
        }
    }

    /// Load the not-included pattern file(s): one regex per line, `#`
    /// comments and blank lines ignored, combined into one alternation.
    pub fn load_not_included<P: AsRef<Path>>(paths: &[P]) -> anyhow::Result<Option<Regex>> {
        use anyhow::Context;

        let mut patterns: Vec<String> = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("open pattern file {}", path.display()))?;
            for raw in text.lines() {
                let line = raw.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                patterns.push(line.to_string());
            }
        }
        if patterns.is_empty() {
            return Ok(None);
        }
        let joined = patterns.join("|");
        let re = Regex::new(&joined).with_context(|| format!("bad pattern alternation {joined:?}"))?;
        Ok(Some(re))
    }

    /// Segment arbitrary text into tagged tokens.
    ///
    /// Concatenating the token texts reproduces the input exactly,
    /// whitespace and symbols included.
    pub fn segment(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        for (kind, block) in split_blocks(text) {
            match kind {
                BlockKind::Ascii => tokens.push(Token::new(block, "eng")),
                BlockKind::Other => tokens.push(Token::new(block, "sym")),
                BlockKind::Han => tokens.extend(self.cut_clip(block)),
            }
        }
        tokens
    }

    /// Convenience: just the token texts.
    pub fn words(&self, text: &str) -> Vec<String> {
        self.segment(text).into_iter().map(|t| t.text).collect()
    }

    /// Shared dictionary store backing this segmenter.
    pub fn store(&self) -> &DictStore {
        &self.store
    }

    /// Decode one CJK clip, via the LRU cache.
    fn cut_clip(&self, clip: &str) -> Vec<Token> {
        if let Some(cached) = self.cache.borrow_mut().get(clip) {
            return cached.clone();
        }

        let chars: Vec<char> = clip.chars().collect();
        let dag = self.build_dag(&chars);
        let (_, choice) = self.best_route(&dag);
        let tokens = self.emit(&chars, &dag, &choice);

        self.cache.borrow_mut().put(clip.to_string(), tokens.clone());
        tokens
    }

    /// Build the DAG for a clip.
    ///
    /// For each start, the span grows while any dictionary still reports a
    /// prefix or a terminal; the recorded edge carries the best terminal
    /// weight across the general dictionary, the name grammar and the
    /// Japanese/English dictionaries.
    fn build_dag(&self, chars: &[char]) -> Vec<Vec<Edge>> {
        let n = chars.len();
        let grammar = self.store.name_grammar(self.weight_floor);
        let mut dag: Vec<Vec<Edge>> = Vec::with_capacity(n);

        for i in 0..n {
            let mut edges: Vec<Edge> = Vec::new();
            let mut frag = String::new();
            for j in i..n {
                frag.push(chars[j]);
                let span = &chars[i..=j];
                let mut alive = false;
                let mut best: Option<(u32, String)> = None;

                let mut consider = |weight: u32, tag: &str, best: &mut Option<(u32, String)>| {
                    if best.as_ref().map(|(w, _)| weight > *w).unwrap_or(true) {
                        *best = Some((weight, tag.to_string()));
                    }
                };

                match self.store.lexicon.lookup(&frag) {
                    Lookup::Word(entry) => {
                        alive = true;
                        consider(entry.weight, &entry.tag, &mut best);
                    }
                    Lookup::Prefix => alive = true,
                    Lookup::Miss => {}
                }

                let name_score = grammar.score(span);
                if name_score > 0 {
                    alive = true;
                    consider(name_score as u32, NAME_TAG, &mut best);
                } else if grammar.viable_prefix(span) {
                    alive = true;
                }

                for dict in [&self.store.japanese, &self.store.english] {
                    match dict.lookup(&frag) {
                        Lookup::Word(entry) => {
                            alive = true;
                            consider(entry.weight, &entry.tag, &mut best);
                        }
                        Lookup::Prefix => alive = true,
                        Lookup::Miss => {}
                    }
                }

                if let Some((weight, tag)) = best {
                    edges.push(Edge {
                        end: j,
                        weight,
                        tag,
                    });
                } else if j == i {
                    // Single-character fallback: the DAG is never empty at
                    // any position, so a best path always exists.
                    edges.push(Edge {
                        end: i,
                        weight: 0,
                        tag: String::new(),
                    });
                }

                if !alive {
                    break;
                }
            }
            dag.push(edges);
        }
        dag
    }

    /// Right-to-left Viterbi over the DAG.
    ///
    /// `route[i] = max over edges (j, w, _) of
    ///     (log(max(w, 1)) - log_total + route[j + 1], j)`
    /// with the natural tuple ordering, so equal scores fall to the longer
    /// span. Returns the cumulative scores and the chosen edge index per
    /// position.
    fn best_route(&self, dag: &[Vec<Edge>]) -> (Vec<f64>, Vec<usize>) {
        let n = dag.len();
        let mut score = vec![0.0f64; n + 1];
        let mut choice = vec![0usize; n];

        for i in (0..n).rev() {
            let mut best_score = f64::NEG_INFINITY;
            let mut best_end = 0usize;
            let mut best_idx = 0usize;
            for (idx, edge) in dag[i].iter().enumerate() {
                let s = (f64::from(edge.weight.max(1))).ln() - self.log_total
                    + score[edge.end + 1];
                if s > best_score || (s == best_score && edge.end > best_end) {
                    best_score = s;
                    best_end = edge.end;
                    best_idx = idx;
                }
            }
            score[i] = best_score;
            choice[i] = best_idx;
        }
        (score, choice)
    }

    /// Walk the chosen route, bonding fallback singles for the re-split.
    fn emit(&self, chars: &[char], dag: &[Vec<Edge>], choice: &[usize]) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut buf = String::new();
        let mut i = 0;
        let n = chars.len();
        while i < n {
            let edge = &dag[i][choice[i]];
            let j = edge.end + 1;
            let frag: String = chars[i..j].iter().collect();
            if j == i + 1 && edge.weight == 0 {
                buf.push_str(&frag);
            } else {
                self.flush_bonded(&mut buf, &mut tokens);
                tokens.push(Token::new(frag, edge.tag.clone()));
            }
            i = j;
        }
        self.flush_bonded(&mut buf, &mut tokens);
        tokens
    }

    /// Re-split a bonded buffer by the not-included alternation and emit the
    /// pieces tagged `x`.
    fn flush_bonded(&self, buf: &mut String, tokens: &mut Vec<Token>) {
        if buf.is_empty() {
            return;
        }
        let single = buf.chars().count() == 1;
        match (&self.not_included, single) {
            (_, true) | (None, _) => tokens.push(Token::new(buf.as_str(), "x")),
            (Some(re), false) => {
                for piece in split_keep(re, buf) {
                    if !piece.is_empty() {
                        tokens.push(Token::new(piece, "x"));
                    }
                }
            }
        }
        buf.clear();
    }
}
