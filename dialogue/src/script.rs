//! The script: an ordered sequence of quoted and narration segments.
//!
//! A book is split line by line on the CJK curly quote pair `“…”`; every
//! non-empty piece becomes a segment carrying its 1-indexed source row. The
//! merger deletes and concatenates neighbours in place and the attributor
//! walks left and right many times per node, so the sequence is stored as an
//! arena-backed doubly linked list: a `Vec` of nodes addressed by index with
//! `prev`/`next` links, never owning pointers. Unlinked nodes stay allocated
//! and unreachable; the arena is released with the book.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// One piece of the book: either a quoted utterance or narration.
///
/// `speaker` stays empty on narration ("voice-over") and on quoted segments
/// nobody could be attributed to ("unknown speaker").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub row_num: u32,
    pub text: String,
    pub is_quoted: bool,
    pub speaker: String,
}

#[derive(Debug, Clone)]
struct Node {
    seg: Segment,
    prev: Option<u32>,
    next: Option<u32>,
}

static QUOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new("“.*?”").expect("quote pattern is valid"));

/// Arena-backed doubly linked segment list in document order.
#[derive(Debug, Clone, Default)]
pub struct Script {
    nodes: Vec<Node>,
    head: Option<u32>,
    tail: Option<u32>,
}

impl Script {
    /// Split a book into segments.
    ///
    /// Physical rows count from 1; every line is trimmed, then cut around
    /// its `“…”` spans with the spans kept, so concatenating one row's
    /// segments reproduces the trimmed line.
    pub fn split(book: &str) -> Self {
        let mut script = Script::default();
        for (idx, raw) in book.split('\n').enumerate() {
            let row_num = (idx + 1) as u32;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            let mut last = 0;
            for m in QUOTE_RE.find_iter(line) {
                if m.start() > last {
                    script.push(row_num, &line[last..m.start()]);
                }
                script.push(row_num, m.as_str());
                last = m.end();
            }
            if last < line.len() {
                script.push(row_num, &line[last..]);
            }
        }
        script
    }

    fn push(&mut self, row_num: u32, text: &str) {
        let is_quoted = text.starts_with('“') && text.ends_with('”') && text.len() > '“'.len_utf8();
        let idx = self.nodes.len() as u32;
        self.nodes.push(Node {
            seg: Segment {
                row_num,
                text: text.to_string(),
                is_quoted,
                speaker: String::new(),
            },
            prev: self.tail,
            next: None,
        });
        match self.tail {
            Some(tail) => self.nodes[tail as usize].next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }

    pub(crate) fn head(&self) -> Option<u32> {
        self.head
    }

    pub(crate) fn next(&self, idx: u32) -> Option<u32> {
        self.nodes[idx as usize].next
    }

    pub(crate) fn prev(&self, idx: u32) -> Option<u32> {
        self.nodes[idx as usize].prev
    }

    pub(crate) fn seg(&self, idx: u32) -> &Segment {
        &self.nodes[idx as usize].seg
    }

    pub(crate) fn seg_mut(&mut self, idx: u32) -> &mut Segment {
        &mut self.nodes[idx as usize].seg
    }

    /// Remove a node from the chain. Its slot stays allocated but
    /// unreachable.
    pub(crate) fn unlink(&mut self, idx: u32) {
        let (prev, next) = {
            let node = &self.nodes[idx as usize];
            (node.prev, node.next)
        };
        match prev {
            Some(p) => self.nodes[p as usize].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n as usize].prev = prev,
            None => self.tail = prev,
        }
        let node = &mut self.nodes[idx as usize];
        node.prev = None;
        node.next = None;
    }

    /// Segments in document order: the consumer contract.
    ///
    /// Text-to-speech and printers treat empty `speaker` on narration as
    /// voice-over and on a quoted segment as an unknown speaker.
    pub fn utterances(&self) -> Utterances<'_> {
        Utterances {
            script: self,
            cursor: self.head,
        }
    }

    /// Number of linked segments.
    pub fn len(&self) -> usize {
        self.utterances().count()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}

/// Document-order iterator over the live segments.
pub struct Utterances<'a> {
    script: &'a Script,
    cursor: Option<u32>,
}

impl<'a> Iterator for Utterances<'a> {
    type Item = &'a Segment;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        self.cursor = self.script.next(idx);
        Some(self.script.seg(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keeps_rows_and_quotes() {
        let book = "第一行无对白\n“你好。”他说。\n\n“单独一行。”";
        let script = Script::split(book);
        let segs: Vec<&Segment> = script.utterances().collect();
        assert_eq!(segs.len(), 4);
        assert_eq!(segs[0].row_num, 1);
        assert!(!segs[0].is_quoted);
        assert_eq!(segs[1].text, "“你好。”");
        assert!(segs[1].is_quoted);
        assert_eq!(segs[1].row_num, 2);
        assert_eq!(segs[2].text, "他说。");
        assert_eq!(segs[2].row_num, 2);
        // The blank physical row still advances numbering.
        assert_eq!(segs[3].row_num, 4);
        assert!(segs[3].is_quoted);
    }

    #[test]
    fn row_segments_reproduce_the_line() {
        let line = "宁默指了指秦海，说道：“这是秦海，我哥们。”然后笑了。";
        let script = Script::split(line);
        let joined: String = script.utterances().map(|s| s.text.as_str()).collect();
        assert_eq!(joined, line);
    }

    #[test]
    fn stray_close_quote_is_narration() {
        let script = Script::split("他说”了什么");
        let segs: Vec<&Segment> = script.utterances().collect();
        assert_eq!(segs.len(), 1);
        assert!(!segs[0].is_quoted);
    }

    #[test]
    fn unlink_rewires_neighbours() {
        let script = &mut Script::split("甲“乙”丙");
        let head = script.head().unwrap();
        let mid = script.next(head).unwrap();
        script.unlink(mid);
        let segs: Vec<&Segment> = script.utterances().collect();
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].text, "甲");
        assert_eq!(segs[1].text, "丙");
        let tail = script.next(head).unwrap();
        assert_eq!(script.prev(tail), Some(head));
    }
}
