//! Compositional Chinese-name matcher.
//!
//! A candidate matches when it decomposes as `<prefix?> <family?> <given?>
//! <suffix?>` with every filled slot a terminal of its own dictionary and the
//! filled slots covering the whole candidate. The slot policy encodes what is
//! idiomatic in prose:
//!
//! - at least two slots must be filled, one of them family or given;
//! - with a prefix and no family, the given name is a single character
//!   (possibly followed by a suffix);
//! - prefix + family take no suffix, and neither does family + given;
//!
//! `score` returns the best terminal weight over all valid decompositions,
//! raised to the configured floor so names can outbid ordinary words in the
//! segmenter's decode, or -1 when nothing matches. `viable_prefix` answers
//! "could a longer candidate still match", which is what keeps the DAG scan
//! alive across partially read names.

use crate::dict::Dict;

/// Matcher over the four name-slot dictionaries.
#[derive(Debug, Clone, Copy)]
pub struct NameGrammar<'a> {
    prefix: &'a Dict,
    family: &'a Dict,
    given: &'a Dict,
    suffix: &'a Dict,
    weight_floor: u32,
}

impl<'a> NameGrammar<'a> {
    pub fn new(
        prefix: &'a Dict,
        family: &'a Dict,
        given: &'a Dict,
        suffix: &'a Dict,
        weight_floor: u32,
    ) -> Self {
        Self {
            prefix,
            family,
            given,
            suffix,
            weight_floor,
        }
    }

    /// Score a candidate, -1 when no valid decomposition exists.
    pub fn score_str(&self, candidate: &str) -> i64 {
        let chars: Vec<char> = candidate.chars().collect();
        self.score(&chars)
    }

    /// Score a candidate given as scalar values.
    pub fn score(&self, chars: &[char]) -> i64 {
        let n = chars.len();
        if n == 0 {
            return -1;
        }

        let mut best: i64 = -1;
        self.walk(chars, |p, f, g, s, used| {
            if used != n {
                return;
            }
            // The name core: an honorific or a role noun alone is not a name.
            if f.is_none() && g.is_none() {
                return;
            }
            let slots = [p, f, g, s];
            let filled = slots.iter().filter(|slot| slot.is_some()).count();
            if filled < 2 {
                return;
            }
            let weight = slots
                .iter()
                .flatten()
                .map(|&(_, w)| i64::from(w))
                .max()
                .unwrap_or(-1);
            if weight > best {
                best = weight;
            }
        });

        if best > 0 {
            best.max(i64::from(self.weight_floor))
        } else {
            -1
        }
    }

    /// True when some longer candidate starting with `chars` could match.
    ///
    /// Being generous here only lengthens the DAG scan by a few probes; being
    /// strict would cut real names short, so any open slot whose dictionary
    /// still reports a fragment keeps the candidate alive.
    pub fn viable_prefix(&self, chars: &[char]) -> bool {
        let n = chars.len();
        if n == 0 {
            return true;
        }

        let mut viable = false;
        self.walk(chars, |p, f, g, _s, used| {
            if viable {
                return;
            }
            if used == n {
                // A partial slot chain with room to grow.
                if p.is_some() || f.is_some() || g.is_some() {
                    viable = true;
                }
                return;
            }

            let rest: String = chars[used..].iter().collect();
            let prefix_open = p.is_none() && f.is_none() && g.is_none();
            if prefix_open && self.prefix.contains_fragment(&rest) {
                viable = true;
                return;
            }
            if f.is_none() && g.is_none() && self.family.contains_fragment(&rest) {
                viable = true;
                return;
            }
            // A given fragment can only grow into a multi-character given
            // name, which the prefix-without-family rule forbids.
            let given_open = g.is_none() && (p.is_none() || f.is_some());
            if given_open && self.given.contains_fragment(&rest) {
                viable = true;
                return;
            }
            let suffix_open = (f.is_some() && p.is_none() && g.is_none())
                || (p.is_some() && f.is_none() && g.is_some());
            if suffix_open && self.suffix.contains_fragment(&rest) {
                viable = true;
            }
        });
        viable
    }

    /// Enumerate policy-respecting slot fills over a left prefix of `chars`.
    ///
    /// `visit` receives `(prefix, family, given, suffix)` as optional
    /// `(len, weight)` pairs plus the number of characters consumed. The
    /// suffix slot is only ever reported when it consumes the tail exactly.
    fn walk<F>(&self, chars: &[char], mut visit: F)
    where
        F: FnMut(
            Option<(usize, u32)>,
            Option<(usize, u32)>,
            Option<(usize, u32)>,
            Option<(usize, u32)>,
            usize,
        ),
    {
        let n = chars.len();
        for p_len in 0..=n {
            let p = match self.slot(self.prefix, chars, 0, p_len) {
                Some(slot) => slot,
                None => continue,
            };
            for f_len in 0..=(n - p_len) {
                let f = match self.slot(self.family, chars, p_len, f_len) {
                    Some(slot) => slot,
                    None => continue,
                };
                for g_len in 0..=(n - p_len - f_len) {
                    // Prefix without family only admits a one-character given.
                    if p_len > 0 && f_len == 0 && g_len > 1 {
                        continue;
                    }
                    let g = match self.slot(self.given, chars, p_len + f_len, g_len) {
                        Some(slot) => slot,
                        None => continue,
                    };
                    let used = p_len + f_len + g_len;
                    visit(p, f, g, None, used);

                    let s_len = n - used;
                    if s_len == 0 {
                        continue;
                    }
                    // Suffix is closed after prefix+family and after a given
                    // name with a family; a bare given takes no suffix
                    // either. Only the bare family and the prefix-skip
                    // single given keep the slot open.
                    let suffix_open = (f_len > 0 && p_len == 0 && g_len == 0)
                        || (p_len > 0 && f_len == 0 && g_len == 1);
                    if !suffix_open {
                        continue;
                    }
                    if let Some(s) = self.slot(self.suffix, chars, used, s_len) {
                        visit(p, f, g, s, n);
                    }
                }
            }
        }
    }

    /// Check one slot: `len == 0` is the empty slot, otherwise the span must
    /// be a terminal of `dict`. Returns `None` when the slot cannot be
    /// filled, `Some(None)` for empty, `Some(Some((len, weight)))` when
    /// filled.
    #[allow(clippy::option_option)]
    fn slot(
        &self,
        dict: &Dict,
        chars: &[char],
        start: usize,
        len: usize,
    ) -> Option<Option<(usize, u32)>> {
        if len == 0 {
            return Some(None);
        }
        if start + len > chars.len() {
            return None;
        }
        let word: String = chars[start..start + len].iter().collect();
        dict.terminal_weight(&word).map(|w| Some((len, w)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar_dicts() -> (Dict, Dict, Dict, Dict) {
        let prefix = Dict::from_text("老\n小\n").unwrap();
        let family = Dict::from_text("刘\n秦\n冷\n周\n柴\n欧阳 2\n").unwrap();
        let given = Dict::from_text("海\n默\n培德 3\n晓晨\n").unwrap();
        let suffix = Dict::from_text("先生\n科长 2\n厂长\n").unwrap();
        (prefix, family, given, suffix)
    }

    fn grammar(dicts: &(Dict, Dict, Dict, Dict)) -> NameGrammar<'_> {
        NameGrammar::new(&dicts.0, &dicts.1, &dicts.2, &dicts.3, 10)
    }

    #[test]
    fn family_plus_given_matches() {
        let dicts = grammar_dicts();
        let g = grammar(&dicts);
        assert_eq!(g.score_str("秦海"), 10);
        assert_eq!(g.score_str("柴培德"), 10);
    }

    #[test]
    fn prefix_plus_single_matches() {
        let dicts = grammar_dicts();
        let g = grammar(&dicts);
        // 刘 is a family name here; 海 a given name. Both single-character
        // continuations of a prefix are idiomatic.
        assert_eq!(g.score_str("老刘"), 10);
        assert_eq!(g.score_str("小秦"), 10);
        assert_eq!(g.score_str("老海"), 10);
    }

    #[test]
    fn family_plus_suffix_matches() {
        let dicts = grammar_dicts();
        let g = grammar(&dicts);
        assert_eq!(g.score_str("冷科长"), 10);
        assert_eq!(g.score_str("周先生"), 10);
    }

    #[test]
    fn single_slot_is_rejected() {
        let dicts = grammar_dicts();
        let g = grammar(&dicts);
        assert_eq!(g.score_str("周"), -1);
        assert_eq!(g.score_str("欧阳"), -1);
        assert_eq!(g.score_str("先生"), -1);
    }

    #[test]
    fn prefix_plus_double_given_is_rejected() {
        let dicts = grammar_dicts();
        let g = grammar(&dicts);
        assert_eq!(g.score_str("老培德"), -1);
    }

    #[test]
    fn no_suffix_after_family_and_given() {
        let dicts = grammar_dicts();
        let g = grammar(&dicts);
        assert_eq!(g.score_str("秦海先生"), -1);
    }

    #[test]
    fn no_suffix_after_prefix_and_family() {
        let dicts = grammar_dicts();
        let g = grammar(&dicts);
        assert_eq!(g.score_str("老刘先生"), -1);
    }

    #[test]
    fn weight_floor_applies() {
        let prefix = Dict::new();
        let family = Dict::from_text("秦 50\n").unwrap();
        let given = Dict::from_text("海 80\n").unwrap();
        let suffix = Dict::new();
        let g = NameGrammar::new(&prefix, &family, &given, &suffix, 10);
        assert_eq!(g.score_str("秦海"), 80);
    }

    #[test]
    fn viable_prefix_tracks_partial_names() {
        let dicts = grammar_dicts();
        let g = grammar(&dicts);
        // 冷 is a complete family-slot chain, 冷科 reaches into 科长.
        assert!(g.viable_prefix(&['冷']));
        assert!(g.viable_prefix(&['冷', '科']));
        assert!(g.viable_prefix(&['欧']));
        assert!(g.viable_prefix(&['柴', '培']));
        assert!(!g.viable_prefix(&['喂', '喂']));
    }
}
