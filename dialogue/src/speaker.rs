//! Speaker attribution.
//!
//! Every quoted segment gets a speaker from a cascade over its neighbouring
//! narration, taken in order:
//!
//! 1. same-row narration after the quote, first sentence only;
//! 2. same-row narration before the quote, last sentence only;
//! 3. a preceding narration node ending in a colon;
//! 4. the speaker of the second-preceding quoted segment (two-party
//!    dialogue alternates A/B/A/B), taken as-is even when that quote was
//!    itself unattributed;
//! 5. the nearest following narration node.
//!
//! Finding a mention inside a sentence is two passes over every contiguous
//! CJK substring of bounded length, begins left to right: first the
//! book-level tally (preferring the longest tallied extension at the
//! earliest begin, so 秦海 beats 秦 and yields to a tallied 秦海文), then
//! the name grammar. Narration keeps the empty speaker; so does a quote
//! nobody can be attributed to.

use libnarrate_core::{utils, Config, DictStore, NameGrammar, NameTally};

use crate::script::Script;

const SENTENCE_END: [char; 3] = ['！', '？', '。'];

/// Everything attribution needs besides the script itself.
pub struct Attributor<'a> {
    tally: &'a NameTally,
    grammar: NameGrammar<'a>,
    min_len: usize,
    max_len: usize,
}

impl<'a> Attributor<'a> {
    pub fn new(tally: &'a NameTally, store: &'a DictStore, config: &Config) -> Self {
        Self {
            tally,
            grammar: store.name_grammar(config.name_weight_floor),
            min_len: config.min_name_len,
            max_len: config.max_name_len,
        }
    }

    /// Assign a speaker to every quoted segment, in document order.
    pub fn attribute(&self, script: &mut Script) {
        let mut cursor = script.head();
        while let Some(idx) = cursor {
            let speaker = if script.seg(idx).is_quoted {
                self.resolve(script, idx)
            } else {
                String::new()
            };
            script.seg_mut(idx).speaker = speaker;
            cursor = script.next(idx);
        }
    }

    fn resolve(&self, script: &Script, idx: u32) -> String {
        let row = script.seg(idx).row_num;

        // Same-row narration after the quote names the speaker up front:
        // “……”宁默说道。
        if let Some(next) = script.next(idx) {
            let seg = script.seg(next);
            if seg.row_num == row && !seg.is_quoted {
                if let Some(name) = self.scan(first_sentence(&seg.text)) {
                    return name;
                }
            }
        }

        // Same-row narration before the quote: 宁默说道：“……”.
        if let Some(prev) = script.prev(idx) {
            let seg = script.seg(prev);
            if seg.row_num == row && !seg.is_quoted {
                if let Some(name) = self.scan(last_sentence(&seg.text)) {
                    return name;
                }
            }
        }

        // A preceding narration line ending in a colon introduces the quote.
        if let Some(prev) = script.prev(idx) {
            let seg = script.seg(prev);
            if !seg.is_quoted && seg.text.ends_with('：') {
                if let Some(name) = self.scan(&seg.text) {
                    return name;
                }
            }
        }

        // Two-party alternation: the quote before the previous quote. Its
        // speaker is taken as-is, so an unattributed chain stays
        // unattributed.
        if let Some(echo) = self.second_preceding_quote(script, idx) {
            return script.seg(echo).speaker.clone();
        }

        // Last resort: the nearest following narration anywhere.
        let mut cursor = script.next(idx);
        while let Some(next) = cursor {
            if !script.seg(next).is_quoted {
                if let Some(name) = self.scan(&script.seg(next).text) {
                    return name;
                }
                break;
            }
            cursor = script.next(next);
        }

        String::new()
    }

    fn second_preceding_quote(&self, script: &Script, idx: u32) -> Option<u32> {
        let mut found = 0;
        let mut cursor = script.prev(idx);
        while let Some(prev) = cursor {
            if script.seg(prev).is_quoted {
                found += 1;
                if found == 2 {
                    return Some(prev);
                }
            }
            cursor = script.prev(prev);
        }
        None
    }

    /// Scan a sentence for a speaker mention.
    fn scan(&self, sentence: &str) -> Option<String> {
        let runs = han_runs(sentence);

        // First pass: the book-level tally. At the earliest begin holding
        // any tallied substring, the longest tallied extension wins.
        for run in &runs {
            let n = run.len();
            for begin in 0..n {
                let mut hit: Option<String> = None;
                let top = self.max_len.min(n - begin);
                for len in self.min_len..=top {
                    let sub: String = run[begin..begin + len].iter().collect();
                    if self.tally.count(&sub) > 0 {
                        hit = Some(sub);
                    }
                }
                if hit.is_some() {
                    return hit;
                }
            }
        }

        // Second pass: anything the name grammar accepts.
        for run in &runs {
            let n = run.len();
            for begin in 0..n {
                let top = self.max_len.min(n - begin);
                for len in self.min_len..=top {
                    let span = &run[begin..begin + len];
                    if self.grammar.score(span) > 0 {
                        return Some(span.iter().collect());
                    }
                }
            }
        }

        None
    }
}

/// Maximal runs of CJK ideographs in a sentence.
fn han_runs(sentence: &str) -> Vec<Vec<char>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for ch in sentence.chars() {
        if utils::is_han(ch) {
            current.push(ch);
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Text before the first sentence-ending mark.
fn first_sentence(text: &str) -> &str {
    match text.find(&SENTENCE_END[..]) {
        Some(pos) => &text[..pos],
        None => text,
    }
}

/// Text after the last sentence-ending mark (ignoring a trailing one).
fn last_sentence(text: &str) -> &str {
    text.split(&SENTENCE_END[..])
        .filter(|piece| !piece.is_empty())
        .last()
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentence_scoping() {
        assert_eq!(first_sentence("宁默说道。他笑了。"), "宁默说道");
        assert_eq!(first_sentence("没有标点"), "没有标点");
        assert_eq!(last_sentence("他笑了。宁默说道："), "宁默说道：");
        assert_eq!(last_sentence("宁默说道。"), "宁默说道");
        assert_eq!(last_sentence(""), "");
    }

    #[test]
    fn han_runs_skip_punctuation() {
        let runs = han_runs("宁默，说道x了");
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0], vec!['宁', '默']);
        assert_eq!(runs[2], vec!['了']);
    }
}
