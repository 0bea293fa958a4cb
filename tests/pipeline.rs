//! 解析 -> 筛选 -> 翻译 -> 重组 的端到端测试

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use md_translator::filter::select_targets;
use md_translator::{
    parse_markdown, render_blocks, FailurePolicy, SqliteCache, TranslationCoordinator, Translator,
};
use tempfile::TempDir;

/// 按词典翻译，不在词典里的文本加前缀
struct DictionaryTranslator {
    dictionary: HashMap<&'static str, &'static str>,
    calls: AtomicUsize,
}

impl DictionaryTranslator {
    fn new() -> Self {
        let dictionary = HashMap::from([
            ("Hello", "こんにちは"),
            ("World", "世界"),
            ("first item", "最初の項目"),
            ("second item", "二番目の項目"),
        ]);
        Self {
            dictionary,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Translator for DictionaryTranslator {
    async fn translate(&self, text: &str) -> md_translator::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .dictionary
            .get(text)
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("[JA]{}", text)))
    }
}

const DOCUMENT: &str = "# Hello\n\nWorld\n\n- first item\n- second item\n\n```rust\nlet x = 1;\n```\n\n![logo](logo.png)\n";

#[tokio::test]
async fn test_translate_document_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let cache = Arc::new(SqliteCache::open(temp_dir.path().join("cache.db")).await.unwrap());
    let translator = Arc::new(DictionaryTranslator::new());

    let mut blocks = parse_markdown(DOCUMENT).unwrap();
    let targets = select_targets(&blocks);
    assert_eq!(targets.len(), 4);

    let report = TranslationCoordinator::new(cache.clone(), translator.clone())
        .with_concurrency(2)
        .translate_all(&mut blocks, &targets)
        .await
        .unwrap();

    assert_eq!(report.completed, 4);
    assert_eq!(report.cache_misses, 4);
    assert_eq!(
        render_blocks(&blocks),
        "# こんにちは\n\n世界\n\n- 最初の項目\n- 二番目の項目\n\n```rust\nlet x = 1;\n```\n\n![logo](logo.png)"
    );
    assert_eq!(cache.len().await.unwrap(), 4);
}

#[tokio::test]
async fn test_second_run_is_served_from_cache() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("cache.db");

    {
        let cache = Arc::new(SqliteCache::open(&db_path).await.unwrap());
        let mut blocks = parse_markdown(DOCUMENT).unwrap();
        let targets = select_targets(&blocks);
        TranslationCoordinator::new(cache, Arc::new(DictionaryTranslator::new()))
            .translate_all(&mut blocks, &targets)
            .await
            .unwrap();
    }

    let cache = Arc::new(SqliteCache::open(&db_path).await.unwrap());
    let translator = Arc::new(DictionaryTranslator::new());
    let mut blocks = parse_markdown(DOCUMENT).unwrap();
    let targets = select_targets(&blocks);

    let report = TranslationCoordinator::new(cache, translator.clone())
        .translate_all(&mut blocks, &targets)
        .await
        .unwrap();

    assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
    assert_eq!(report.cache_hits, 4);
    assert!(render_blocks(&blocks).starts_with("# こんにちは\n\n世界"));
}

#[tokio::test]
async fn test_repeated_sources_share_one_cache_entry() {
    let temp_dir = TempDir::new().unwrap();
    let cache = Arc::new(SqliteCache::open(temp_dir.path().join("cache.db")).await.unwrap());

    let doc = "Hello\n\nHello\n\nHello";
    let mut blocks = parse_markdown(doc).unwrap();
    let targets = select_targets(&blocks);

    let report = TranslationCoordinator::new(cache.clone(), Arc::new(DictionaryTranslator::new()))
        .with_failure_policy(FailurePolicy::Abort)
        .translate_all(&mut blocks, &targets)
        .await
        .unwrap();

    assert!(!report.has_failures());
    assert_eq!(cache.len().await.unwrap(), 1);
    assert_eq!(render_blocks(&blocks), "こんにちは\n\nこんにちは\n\nこんにちは");
}

#[test]
fn test_untranslated_document_round_trips() {
    let blocks = parse_markdown(DOCUMENT).unwrap();
    assert_eq!(render_blocks(&blocks), DOCUMENT.trim_end_matches('\n'));
}
