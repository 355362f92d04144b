//! Quote merging: reclassify syntactic quotes as narration.
//!
//! Not everything between curly quotes is dialogue. `素有“鬼才”之称` quotes a
//! common noun, and chapter openers like a bare `“天才”` at line start are
//! scare-quotes too. Both read as narration that happens to contain quote
//! marks, so the affected quoted segment is absorbed into its previous
//! neighbour (the quotes kept in the text) together with the narration piece
//! following it on the same row.

use libnarrate_core::utils;

use crate::script::Script;

const SENTENCE_END: [char; 3] = ['。', '！', '？'];

fn ends_in_word_char(text: &str) -> bool {
    text.chars().last().map(utils::is_word_char).unwrap_or(false)
}

fn starts_with_word_char(text: &str) -> bool {
    text.chars().next().map(utils::is_word_char).unwrap_or(false)
}

/// True when the text inside the quotes carries sentence-ending punctuation,
/// which marks real dialogue rather than a quoted term.
fn inner_has_sentence_end(quoted: &str) -> bool {
    let inner = quoted
        .trim_start_matches('“')
        .trim_end_matches('”');
    inner.chars().any(|ch| SENTENCE_END.contains(&ch))
}

/// Collapse non-dialogic quoted segments into their surrounding narration.
///
/// A quoted segment is absorbed into its previous sibling when either
///
/// 1. the previous sibling is on the same row and its text ends in a word
///    character (the opening quote abuts an ideograph, letter or digit), or
/// 2. the previous sibling is on a different row, the next sibling is on the
///    same row starting with a word character, and the quoted text has no
///    interior sentence-ending punctuation.
///
/// In both cases the immediately following same-row segment is absorbed as
/// well. Running the pass twice changes nothing.
pub fn merge_quotes(script: &mut Script) {
    let mut cursor = script.head();
    while let Some(idx) = cursor {
        let advance = script.next(idx);
        if !script.seg(idx).is_quoted {
            cursor = advance;
            continue;
        }

        let prev = match script.prev(idx) {
            Some(prev) => prev,
            None => {
                cursor = advance;
                continue;
            }
        };

        let row = script.seg(idx).row_num;
        let same_row_prev = script.seg(prev).row_num == row;

        let absorb = if same_row_prev {
            ends_in_word_char(&script.seg(prev).text)
        } else {
            match script.next(idx) {
                Some(next) => {
                    script.seg(next).row_num == row
                        && starts_with_word_char(&script.seg(next).text)
                        && !inner_has_sentence_end(&script.seg(idx).text)
                }
                None => false,
            }
        };

        if !absorb {
            cursor = advance;
            continue;
        }

        let quoted_text = script.seg(idx).text.clone();
        script.seg_mut(prev).text.push_str(&quoted_text);
        script.seg_mut(prev).is_quoted = false;
        let after = script.next(idx);
        script.unlink(idx);

        let mut resume = after;
        if let Some(next) = after {
            if script.seg(next).row_num == row {
                let next_text = script.seg(next).text.clone();
                script.seg_mut(prev).text.push_str(&next_text);
                resume = script.next(next);
                script.unlink(next);
            }
        }
        cursor = resume;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(script: &Script) -> Vec<(String, bool)> {
        script
            .utterances()
            .map(|s| (s.text.clone(), s.is_quoted))
            .collect()
    }

    #[test]
    fn scare_quote_in_running_text_is_absorbed() {
        let mut script = Script::split("在整个科学院系统都素有“鬼才”之称");
        merge_quotes(&mut script);
        let segs = texts(&script);
        assert_eq!(
            segs,
            vec![("在整个科学院系统都素有“鬼才”之称".to_string(), false)]
        );
    }

    #[test]
    fn dialogue_after_punctuation_is_kept() {
        let mut script = Script::split("他说道：“今天不行。”");
        merge_quotes(&mut script);
        let segs = texts(&script);
        assert_eq!(segs.len(), 2);
        assert!(segs[1].1, "quote must survive: {segs:?}");
    }

    #[test]
    fn line_start_scare_quote_is_absorbed() {
        let mut script = Script::split("上一行。\n“鬼才”两个字在厂里传开了");
        merge_quotes(&mut script);
        let segs = texts(&script);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].0, "上一行。“鬼才”两个字在厂里传开了");
        assert!(!segs[0].1);
    }

    #[test]
    fn line_start_dialogue_is_kept() {
        // Interior sentence punctuation marks real dialogue even when the
        // continuation starts with an ideograph.
        let mut script = Script::split("上一行。\n“今天不行。”他摇了摇头");
        merge_quotes(&mut script);
        let segs = texts(&script);
        assert_eq!(segs.len(), 3);
        assert!(segs[1].1);
    }

    #[test]
    fn merger_is_idempotent() {
        let book = "在整个科学院系统都素有“鬼才”之称\n\
                    宁默说道：“这是秦海，我哥们。”\n\
                    “王晓晨，原来是你。”宁默认识那姑娘。";
        let mut once = Script::split(book);
        merge_quotes(&mut once);
        let mut twice = Script::split(book);
        merge_quotes(&mut twice);
        merge_quotes(&mut twice);
        assert_eq!(texts(&once), texts(&twice));
    }
}
