//! Dump the reconciled character-name tally of a book, or preview the raw
//! segmentation with `--cut`.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use libnarrate_core::{Config, NameTally};
use narrate_tools::{build_segmenter, init_tracing, load_book};

#[derive(Parser)]
#[command(about = "Extract character names from a novel")]
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

    /// Print at most this many names
    #[arg(long, default_value_t = 200)]
    limit: usize,

    /// Emit JSON instead of "name count" lines
    #[arg(long)]
    json: bool,

    /// Print the segmentation itself, slash-joined, instead of the tally
    #[arg(long)]
    cut: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_toml(path)?,
        None => Config::default(),
    };

    let (_store, segmenter) =
        build_segmenter(&args.dict_dir, args.patterns.as_ref(), &args.add_words, &config)?;
    let book = load_book(&args.book)?;

    if args.cut {
        println!("{}", segmenter.words(&book).join("/"));
        return Ok(());
    }

    let tally = NameTally::collect(&segmenter, &book, &config);
    let ranked: Vec<(String, u32)> = tally.ranked().into_iter().take(args.limit).collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&ranked)?);
    } else {
        for (name, count) in ranked {
            println!("{name} {count}");
        }
    }

    Ok(())
}
