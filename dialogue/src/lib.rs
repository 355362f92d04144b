//! libnarrate-dialogue
//!
//! Turns a segmented novel into an attributed script: an ordered sequence of
//! utterances, each either narration (voice-over) or a quoted line with the
//! most plausible speaker.
//!
//! The pipeline is three passes over an arena-backed doubly linked segment
//! list:
//!
//! 1. split the book on `“…”` quote spans (`Script::split`),
//! 2. absorb non-dialogic scare-quotes into narration (`merge_quotes`),
//! 3. assign speakers with the heuristic cascade (`Attributor`).
//!
//! Public API:
//! - `Script` / `Segment` / `Utterances` - the segment list and its
//!   document-order iterator (the consumer contract)
//! - `merge_quotes` - quote merger
//! - `Attributor` - speaker attribution
//! - `analyse` - the whole pipeline over one book

use libnarrate_core::{Config, DictStore, NameTally, Segmenter};

pub mod script;
pub use script::{Script, Segment, Utterances};

pub mod merge;
pub use merge::merge_quotes;

pub mod speaker;
pub use speaker::Attributor;

/// Run the whole dialogue pipeline over a book held in memory.
///
/// Tallies names with the segmenter, splits the book, merges syntactic
/// quotes and attributes speakers. Returns the finished script and the
/// reconciled tally (callers often want both: the tally drives voice
/// assignment downstream).
pub fn analyse(
    book: &str,
    segmenter: &Segmenter,
    store: &DictStore,
    config: &Config,
) -> (Script, NameTally) {
    let tally = NameTally::collect(segmenter, book, config);

    let mut script = Script::split(book);
    merge_quotes(&mut script);

    let attributor = Attributor::new(&tally, store, config);
    attributor.attribute(&mut script);

    let line_count = script.len();
    let speaker_count = script
        .utterances()
        .filter(|seg| !seg.speaker.is_empty())
        .count();
    tracing::info!(
        line_count,
        speaker_count,
        rate = speaker_count as f64 / line_count.max(1) as f64,
        "analyse done"
    );

    (script, tally)
}
