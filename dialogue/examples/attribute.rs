//! Attribute a tiny embedded scene and print the script.
//!
//! Run with: cargo run -p libnarrate-dialogue --example attribute

use std::sync::Arc;

use libnarrate_core::{Config, Dict, DictStore, Segmenter};
use libnarrate_dialogue::analyse;

const SCENE: &str = "在整个科学院系统都素有“鬼才”之称\n\
                     宁默倒也认识那姑娘，他用手指了指秦海，说道：“这是秦海，我哥们。”\n\
                     “王晓晨，原来是你住在对面啊。”宁默说道。\n\
                     柴培德道：\n\
                     “像韦宝林这种干部，以后你要多加小心。”";

fn build_store() -> Result<DictStore, Box<dyn std::error::Error>> {
    let mut store = DictStore::default();
    store.lexicon = Dict::from_text(
        "认识 260 v\n说道 400 v\n那姑娘 40 n\n素有 30 v\n之称 25 n\n\
         科学院 60 nt\n系统 280 n\n整个 220 b\n干部 160 n\n小心 140 a\n",
    )?;
    store.prefix = Dict::from_text("老\n小\n")?;
    store.family = Dict::from_text("秦\n宁\n王\n柴\n韦\n")?;
    store.given = Dict::from_text("海\n默\n晓晨 2\n培德 2\n宝林 2\n")?;
    store.suffix = Dict::from_text("科长\n厂长\n")?;
    Ok(store)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let store = Arc::new(build_store()?);
    let segmenter = Segmenter::new(Arc::clone(&store), None, &config);

    let (script, tally) = analyse(SCENE, &segmenter, &store, &config);

    println!("names:");
    for (name, count) in tally.ranked() {
        println!("  {name} {count}");
    }

    println!("script:");
    for seg in script.utterances() {
        let role = if seg.is_quoted { seg.speaker.as_str() } else { "" };
        println!("  [{:>4}][{:　<3}] {}", seg.row_num, role, seg.text);
    }
    Ok(())
}
