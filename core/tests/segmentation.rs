// Segmentation scenarios over the shipped dictionary files: names beating
// common words, bare family names staying ordinary, and full coverage of
// the input text.

use std::path::PathBuf;
use std::sync::Arc;

use libnarrate_core::{Config, DictSources, DictStore, Segmenter, NAME_TAG};

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../data/dict")
}

fn shipped_segmenter(cache: &std::path::Path) -> Segmenter {
    let config = Config {
        cache_dir: cache.to_path_buf(),
        ..Config::default()
    };
    let sources = DictSources::from_dir(data_dir());
    let store = Arc::new(DictStore::load(&sources, &config).unwrap());
    let not_included =
        Segmenter::load_not_included(&[data_dir().join("not_included.txt")]).unwrap();
    Segmenter::new(store, not_included, &config)
}

#[test]
fn shipped_dictionaries_recognise_names() {
    let tmp = tempfile::tempdir().unwrap();
    let seg = shipped_segmenter(tmp.path());

    let tokens = seg.segment("老刘，你们就照小秦和冷科长的安排去做");
    let names: Vec<&str> = tokens
        .iter()
        .filter(|t| t.tag == NAME_TAG)
        .map(|t| t.text.as_str())
        .collect();
    assert!(names.contains(&"老刘"), "names: {names:?}");
    assert!(names.contains(&"小秦"), "names: {names:?}");
    assert!(names.contains(&"冷科长"), "names: {names:?}");
}

#[test]
fn bare_family_name_is_not_tagged() {
    let tmp = tempfile::tempdir().unwrap();
    let seg = shipped_segmenter(tmp.path());

    let tokens = seg.segment("周工真的不想");
    for token in &tokens {
        assert!(
            !(token.text == "周" && token.tag == NAME_TAG),
            "tokens: {tokens:?}"
        );
    }
}

#[test]
fn coverage_holds_on_mixed_text() {
    let tmp = tempfile::tempdir().unwrap();
    let seg = shipped_segmenter(tmp.path());

    let inputs = [
        "当下雨天地面积水分外严重",
        "路边一位戴着眼镜蛇的文化人",
        "第3024章 工作安排（A-2版）",
        "mixed 中英文 text, with punctuation!",
    ];
    for input in inputs {
        let joined: String = seg.segment(input).iter().map(|t| t.text.as_str()).collect();
        assert_eq!(joined, input);
    }
}

#[test]
fn numerals_split_out_of_bonded_runs() {
    let tmp = tempfile::tempdir().unwrap();
    let seg = shipped_segmenter(tmp.path());

    // 三千零二十四 is nobody's dictionary word; the not-included patterns
    // pull the numeral run out of the bonded buffer.
    let tokens = seg.segment("第三千零二十四章");
    let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
    assert!(texts.contains(&"三千零二十四"), "tokens: {texts:?}");
    assert!(texts.contains(&"第"), "tokens: {texts:?}");
}
