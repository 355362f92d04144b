//! Book-scale name aggregation.
//!
//! The extractor runs the segmenter over a whole book and tallies every
//! token tagged `nr`. Segmentation errors show up as low-frequency
//! extensions of real names (a trailing verb glued on: 秦海道 next to 秦海),
//! so a reconciliation pass walks the tally from the longest candidates down
//! and folds any candidate into a proper substring that out-occurs it by the
//! configured ratio. Folded entries stay in the tally at count 0.

use ahash::AHashMap;

use crate::{Config, Segmenter, NAME_TAG};

/// Insertion-ordered name-to-count tally.
#[derive(Debug, Clone, Default)]
pub struct NameTally {
    counts: AHashMap<String, u32>,
    order: Vec<String>,
}

impl NameTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally the names of a whole book and reconcile.
    pub fn collect(segmenter: &Segmenter, book: &str, config: &Config) -> Self {
        let mut tally = Self::new();
        for token in segmenter.segment(book) {
            if token.tag != NAME_TAG {
                continue;
            }
            let len = token.text.chars().count();
            if len < config.min_name_len || len > config.max_name_len {
                continue;
            }
            // A candidate that doubles as an ordinary lexicon word is a
            // dictionary collision, not a character name.
            if segmenter.store().lexicon.contains_terminal(&token.text) {
                continue;
            }
            tally.add(&token.text);
        }
        tracing::debug!(candidates = tally.order.len(), "name tally before reconcile");
        tally.reconcile(config.reconcile_ratio);
        tracing::debug!(
            survivors = tally.counts.values().filter(|&&c| c > 0).count(),
            "name tally after reconcile"
        );
        tally
    }

    /// Add one occurrence of a candidate.
    pub fn add(&mut self, name: &str) {
        self.add_count(name, 1);
    }

    /// Add several occurrences at once (tests seed tallies this way).
    pub fn add_count(&mut self, name: &str, count: u32) {
        if let Some(slot) = self.counts.get_mut(name) {
            *slot += count;
            return;
        }
        self.counts.insert(name.to_string(), count);
        self.order.push(name.to_string());
    }

    /// Count for a candidate, 0 when absent.
    pub fn count(&self, name: &str) -> u32 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    /// Number of candidates ever seen, folded ones included.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Fold spurious long candidates into dominating substrings.
    ///
    /// Candidates are visited by descending character length, ties in
    /// insertion order. For the first proper substring s (at least two
    /// characters, still counted) with `count(s) * ratio > count(c)`, c's
    /// count moves onto s and c drops to 0. A candidate that strictly
    /// out-occurs every substring is never folded.
    pub fn reconcile(&mut self, ratio: f64) {
        let mut by_length: Vec<String> = self.order.clone();
        by_length.sort_by_key(|name| std::cmp::Reverse(name.chars().count()));

        for name in by_length {
            let count = self.count(&name);
            if count == 0 {
                continue;
            }
            let chars: Vec<char> = name.chars().collect();
            let n = chars.len();
            if n <= 2 {
                continue;
            }

            'outer: for begin in 0..n {
                for end in (begin + 2)..=n {
                    if end - begin == n {
                        continue;
                    }
                    let sub: String = chars[begin..end].iter().collect();
                    let sub_count = self.count(&sub);
                    if sub_count == 0 {
                        continue;
                    }
                    if f64::from(sub_count) * ratio > f64::from(count) {
                        tracing::trace!(%name, %sub, count, sub_count, "fold name into root");
                        if let Some(slot) = self.counts.get_mut(&sub) {
                            *slot += count;
                        }
                        if let Some(slot) = self.counts.get_mut(&name) {
                            *slot = 0;
                        }
                        break 'outer;
                    }
                }
            }
        }
    }

    /// Surviving candidates, descending by count, ties in insertion order.
    pub fn ranked(&self) -> Vec<(String, u32)> {
        let mut out: Vec<(String, u32)> = self
            .order
            .iter()
            .map(|name| (name.clone(), self.count(name)))
            .filter(|&(_, count)| count > 0)
            .collect();
        out.sort_by_key(|&(_, count)| std::cmp::Reverse(count));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Dict, DictStore};
    use std::sync::Arc;

    #[test]
    fn collect_tallies_names_but_not_lexicon_collisions() {
        let mut store = DictStore::default();
        // 文静 is both a plausible name composition and an everyday word;
        // the low lexicon weight loses the decode but still vetoes the tally.
        store.lexicon = Dict::from_text("文静 1\n说道 20\n").unwrap();
        store.family = Dict::from_text("秦\n文\n").unwrap();
        store.given = Dict::from_text("海\n静\n").unwrap();
        let segmenter = Segmenter::new(Arc::new(store), None, &Config::default());

        let tally = NameTally::collect(
            &segmenter,
            "秦海说道文静说道秦海说道",
            &Config::default(),
        );
        assert_eq!(tally.count("秦海"), 2);
        assert_eq!(tally.count("文静"), 0);
    }

    #[test]
    fn fold_moves_count_onto_root() {
        let mut tally = NameTally::new();
        tally.add_count("秦海", 100);
        tally.add_count("秦海道", 10);
        tally.reconcile(0.2);
        assert_eq!(tally.count("秦海道"), 0);
        assert_eq!(tally.count("秦海"), 110);
    }

    #[test]
    fn close_ratio_leaves_both() {
        let mut tally = NameTally::new();
        tally.add_count("秦海", 100);
        tally.add_count("秦海道", 60);
        tally.reconcile(0.2);
        assert_eq!(tally.count("秦海道"), 60);
        assert_eq!(tally.count("秦海"), 100);
    }

    #[test]
    fn dominant_candidate_is_never_folded() {
        let mut tally = NameTally::new();
        tally.add_count("宁中英", 80);
        tally.add_count("宁中", 15);
        tally.add_count("中英", 12);
        tally.reconcile(0.2);
        // 80 strictly exceeds 5x of every proper substring's count.
        assert_eq!(tally.count("宁中英"), 80);
        assert_eq!(tally.count("宁中"), 15);
        assert_eq!(tally.count("中英"), 12);
    }

    #[test]
    fn folding_cascades_longest_first() {
        let mut tally = NameTally::new();
        tally.add_count("秦海", 200);
        tally.add_count("秦海道", 8);
        tally.add_count("秦海道的", 1);
        tally.reconcile(0.2);
        assert_eq!(tally.count("秦海"), 209);
        assert_eq!(tally.count("秦海道"), 0);
        assert_eq!(tally.count("秦海道的"), 0);
    }

    #[test]
    fn ranked_is_descending_and_skips_folded() {
        let mut tally = NameTally::new();
        tally.add_count("秦海", 100);
        tally.add_count("王晓晨", 40);
        tally.add_count("秦海道", 10);
        tally.reconcile(0.2);
        let ranked = tally.ranked();
        assert_eq!(ranked[0].0, "秦海");
        assert_eq!(ranked[0].1, 110);
        assert_eq!(ranked[1].0, "王晓晨");
        assert!(ranked.iter().all(|&(_, c)| c > 0));
    }
}
