//! Attribute a whole book and print the script.
//!
//! Text output mirrors what a narrator console wants: row number, speaker
//! (blank for voice-over), then the segment text. `--json` emits one JSON
//! object per utterance for downstream speech synthesis.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use libnarrate_core::Config;
use libnarrate_dialogue::analyse;
use narrate_tools::{build_segmenter, init_tracing, load_book};

#[derive(Parser)]
#[command(about = "Split a novel into attributed utterances")]
struct Args {
    /// Book file (UTF-8, falling back to GB18030)
    book: PathBuf,

    /// Directory holding the dictionary files
    #[arg(long, default_value = "data/dict")]
    dict_dir: PathBuf,

    /// Not-included pattern file (defaults to <dict-dir>/not_included.txt)
    #[arg(long)]
    patterns: Option<PathBuf>,

    /// Optional TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Inject a word before analysis: WORD[:WEIGHT[:TAG]] (repeatable)
    #[arg(long = "add-word")]
    add_words: Vec<String>,

    /// Emit one JSON object per utterance instead of the text listing
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_toml(path)?,
        None => Config::default(),
    };

    let (store, segmenter) =
        build_segmenter(&args.dict_dir, args.patterns.as_ref(), &args.add_words, &config)?;
    let book = load_book(&args.book)?;

    let (script, _tally) = analyse(&book, &segmenter, &store, &config);

    let mut stdout = std::io::stdout().lock();
    use std::io::Write;

    if args.json {
        for seg in script.utterances() {
            serde_json::to_writer(&mut stdout, seg)?;
            writeln!(stdout)?;
        }
    } else {
        let mut last_row = 0u32;
        for seg in script.utterances() {
            let row = if seg.row_num == last_row {
                String::new()
            } else {
                seg.row_num.to_string()
            };
            last_row = seg.row_num;
            writeln!(stdout, "{row:<5} [{:　<3}] {}", seg.speaker, seg.text)?;
        }
    }

    Ok(())
}
