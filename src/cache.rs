//! 翻译缓存模块
//!
//! 以原文的精确文本为键，持久化保存已获得的译文，避免重复翻译。
//!
//! # 语义
//!
//! - 查询：命中返回译文，未命中返回 `None`
//! - 插入：只在键不存在时插入，从不覆盖。键已存在时返回
//!   [`InsertOutcome::AlreadyExists`]，这是并发翻译相同片段时的正常结果，不是错误
//! - 其他任何存储错误（I/O、表结构不匹配等）都作为 [`crate::error::TranslationError::Cache`] 返回，对流水线是致命的

// 标准库导入
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

// 第三方crate导入
use async_trait::async_trait;
use libsql::{Builder, Connection, Database};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// 本地模块导入
use crate::error::Result;
use crate::translation_error;

/// 插入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// 新条目已写入
    Inserted,
    /// 相同原文的条目已存在（唯一键冲突），未做任何修改
    AlreadyExists,
}

/// 缓存条目
///
/// JSON导出/导入时字段名为 `sourceText` / `translatedText` / `isValid`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub source_text: String,
    pub translated_text: String,
    #[serde(default = "default_valid")]
    pub is_valid: bool,
}

fn default_valid() -> bool {
    true
}

/// 翻译缓存接口
///
/// 实现必须支持多个任务并发调用 `lookup` / `insert`，并自行保证插入的原子性
#[async_trait]
pub trait TranslationCache: Send + Sync {
    /// 按原文查询译文
    async fn lookup(&self, source_text: &str) -> Result<Option<String>>;

    /// 仅在原文不存在时插入
    async fn insert(
        &self,
        source_text: &str,
        translated_text: &str,
        is_valid: bool,
    ) -> Result<InsertOutcome>;
}

/// 基于SQLite (libsql) 的持久化缓存
///
/// 表结构：
///
/// ```sql
/// CREATE TABLE translations (
///     source_text TEXT PRIMARY KEY,
///     translated_text TEXT NOT NULL,
///     is_valid BOOLEAN NOT NULL DEFAULT 1
/// )
/// ```
#[derive(Debug, Clone)]
pub struct SqliteCache {
    db: Arc<Database>,
    path: PathBuf,
}

impl SqliteCache {
    /// 打开（必要时创建）缓存数据库并初始化表结构
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    translation_error!(file_op, parent.display(), "创建目录", e)
                })?;
            }
        }

        let db = Builder::new_local(&path).build().await.map_err(|e| {
            translation_error!(cache, "打开", format!("{}: {}", path.display(), e))
        })?;

        let cache = Self {
            db: Arc::new(db),
            path,
        };
        cache.initialize_schema().await?;

        debug!("翻译缓存已打开: {}", cache.path.display());
        Ok(cache)
    }

    /// 数据库文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn initialize_schema(&self) -> Result<()> {
        let conn = self.connect().await?;

        execute_pragma(&conn, "PRAGMA journal_mode = WAL").await?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS translations (
                source_text TEXT PRIMARY KEY,
                translated_text TEXT NOT NULL,
                is_valid BOOLEAN NOT NULL DEFAULT 1
            )",
            (),
        )
        .await
        .map_err(|e| translation_error!(cache, "建表", e))?;

        // 旧版本的表可能缺少列，这里提前失败而不是在翻译中途失败
        conn.query(
            "SELECT source_text, translated_text, is_valid FROM translations LIMIT 0",
            (),
        )
        .await
        .map_err(|e| translation_error!(cache, "校验表结构", e))?;

        Ok(())
    }

    /// 每次操作使用独立连接，并设置忙等待超时以容忍并发写入
    async fn connect(&self) -> Result<Connection> {
        let conn = self
            .db
            .connect()
            .map_err(|e| translation_error!(cache, "连接", e))?;
        execute_pragma(&conn, "PRAGMA busy_timeout = 5000").await?;
        Ok(conn)
    }

    /// 条目数量
    pub async fn len(&self) -> Result<usize> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query("SELECT COUNT(*) FROM translations", ())
            .await
            .map_err(|e| translation_error!(cache, "计数", e))?;

        let count = match rows.next().await? {
            Some(row) => row.get::<i64>(0)?,
            None => 0,
        };
        Ok(count.max(0) as usize)
    }

    /// 导出全部条目（按原文排序）
    pub async fn dump(&self) -> Result<Vec<CacheEntry>> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                "SELECT source_text, translated_text, is_valid FROM translations ORDER BY source_text",
                (),
            )
            .await
            .map_err(|e| translation_error!(cache, "导出", e))?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(CacheEntry {
                source_text: row.get::<String>(0)?,
                translated_text: row.get::<String>(1)?,
                is_valid: row.get::<i64>(2)? != 0,
            });
        }

        debug!("导出缓存条目: {} 条", entries.len());
        Ok(entries)
    }

    /// 批量导入条目，返回实际新增的数量
    ///
    /// `replace` 为真时先清空表；否则已存在的原文保持不变
    pub async fn load(&self, entries: &[CacheEntry], replace: bool) -> Result<usize> {
        let conn = self.connect().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| translation_error!(cache, "开启事务", e))?;

        if replace {
            tx.execute("DELETE FROM translations", ())
                .await
                .map_err(|e| translation_error!(cache, "清空", e))?;
        }

        let mut inserted = 0;
        for entry in entries {
            let changed = tx
                .execute(
                    "INSERT OR IGNORE INTO translations (source_text, translated_text, is_valid) VALUES (?, ?, ?)",
                    (
                        entry.source_text.as_str(),
                        entry.translated_text.as_str(),
                        entry.is_valid as i64,
                    ),
                )
                .await
                .map_err(|e| translation_error!(cache, "导入", e))?;
            inserted += changed as usize;
        }

        tx.commit()
            .await
            .map_err(|e| translation_error!(cache, "提交事务", e))?;

        info!("📥 导入缓存条目: {} / {}", inserted, entries.len());
        Ok(inserted)
    }
}

#[async_trait]
impl TranslationCache for SqliteCache {
    async fn lookup(&self, source_text: &str) -> Result<Option<String>> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                "SELECT translated_text FROM translations WHERE source_text = ?",
                [source_text],
            )
            .await
            .map_err(|e| translation_error!(cache, "查询", e))?;

        match rows.next().await? {
            Some(row) => Ok(Some(row.get::<String>(0)?)),
            None => Ok(None),
        }
    }

    async fn insert(
        &self,
        source_text: &str,
        translated_text: &str,
        is_valid: bool,
    ) -> Result<InsertOutcome> {
        let conn = self.connect().await?;
        let changed = conn
            .execute(
                "INSERT OR IGNORE INTO translations (source_text, translated_text, is_valid) VALUES (?, ?, ?)",
                (source_text, translated_text, is_valid as i64),
            )
            .await
            .map_err(|e| translation_error!(cache, "插入", e))?;

        if changed == 0 {
            Ok(InsertOutcome::AlreadyExists)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }
}

/// PRAGMA会返回结果行，必须用query执行
async fn execute_pragma(conn: &Connection, pragma: &str) -> Result<()> {
    conn.query(pragma, ())
        .await
        .map_err(|e| translation_error!(cache, "执行PRAGMA", format!("'{}': {}", pragma, e)))?;
    Ok(())
}

/// 进程内缓存
///
/// 用于 `--no-cache`（只在本次运行内去重）以及测试
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预先填充条目
    pub fn with_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = CacheEntry>,
    {
        let map = entries
            .into_iter()
            .map(|entry| (entry.source_text.clone(), entry))
            .collect();
        Self {
            entries: Mutex::new(map),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 读取完整条目（含有效性标记）
    pub fn entry(&self, source_text: &str) -> Option<CacheEntry> {
        self.entries
            .lock()
            .ok()
            .and_then(|m| m.get(source_text).cloned())
    }

    fn locked(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, CacheEntry>>> {
        self.entries
            .lock()
            .map_err(|e| translation_error!(cache, "加锁", e))
    }
}

#[async_trait]
impl TranslationCache for MemoryCache {
    async fn lookup(&self, source_text: &str) -> Result<Option<String>> {
        Ok(self
            .locked()?
            .get(source_text)
            .map(|entry| entry.translated_text.clone()))
    }

    async fn insert(
        &self,
        source_text: &str,
        translated_text: &str,
        is_valid: bool,
    ) -> Result<InsertOutcome> {
        let mut entries = self.locked()?;
        if entries.contains_key(source_text) {
            return Ok(InsertOutcome::AlreadyExists);
        }

        entries.insert(
            source_text.to_string(),
            CacheEntry {
                source_text: source_text.to_string(),
                translated_text: translated_text.to_string(),
                is_valid,
            },
        );
        Ok(InsertOutcome::Inserted)
    }
}

/// 从JSON文件读取缓存条目
pub fn read_entries_json<P: AsRef<Path>>(path: P) -> Result<Vec<CacheEntry>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| translation_error!(file_op, path.display(), "读取", e))?;
    let entries: Vec<CacheEntry> = serde_json::from_str(&content)?;
    Ok(entries)
}

/// 把缓存条目写入JSON文件（带缩进）
pub fn write_entries_json<P: AsRef<Path>>(path: P, entries: &[CacheEntry]) -> Result<()> {
    let path = path.as_ref();
    let content = serde_json::to_string_pretty(entries)?;
    std::fs::write(path, content)
        .map_err(|e| translation_error!(file_op, path.display(), "写入", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TranslationError;
    use tempfile::TempDir;

    async fn open_temp_cache() -> (SqliteCache, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let cache = SqliteCache::open(temp_dir.path().join("translations.db"))
            .await
            .unwrap();
        (cache, temp_dir)
    }

    fn entry(source: &str, translated: &str) -> CacheEntry {
        CacheEntry {
            source_text: source.to_string(),
            translated_text: translated.to_string(),
            is_valid: true,
        }
    }

    #[tokio::test]
    async fn test_sqlite_lookup_miss_then_hit() {
        let (cache, _dir) = open_temp_cache().await;

        assert_eq!(cache.lookup("Hello").await.unwrap(), None);
        assert_eq!(
            cache.insert("Hello", "こんにちは", true).await.unwrap(),
            InsertOutcome::Inserted
        );
        assert_eq!(
            cache.lookup("Hello").await.unwrap(),
            Some("こんにちは".to_string())
        );
    }

    #[tokio::test]
    async fn test_sqlite_duplicate_insert_keeps_first() {
        let (cache, _dir) = open_temp_cache().await;

        cache.insert("Hello", "first", true).await.unwrap();
        let outcome = cache.insert("Hello", "second", false).await.unwrap();

        assert_eq!(outcome, InsertOutcome::AlreadyExists);
        assert_eq!(cache.lookup("Hello").await.unwrap(), Some("first".to_string()));
        assert_eq!(cache.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_key_is_exact_text() {
        let (cache, _dir) = open_temp_cache().await;

        cache.insert("Hello", "a", true).await.unwrap();
        assert_eq!(cache.lookup("hello").await.unwrap(), None);
        assert_eq!(cache.lookup("Hello ").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sqlite_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("cache.db");

        {
            let cache = SqliteCache::open(&path).await.unwrap();
            cache.insert("World", "世界", false).await.unwrap();
        }

        let cache = SqliteCache::open(&path).await.unwrap();
        assert_eq!(cache.lookup("World").await.unwrap(), Some("世界".to_string()));

        let dumped = cache.dump().await.unwrap();
        assert_eq!(dumped.len(), 1);
        assert!(!dumped[0].is_valid);
    }

    #[tokio::test]
    async fn test_sqlite_concurrent_duplicate_inserts() {
        let (cache, _dir) = open_temp_cache().await;
        let cache = Arc::new(cache);

        let mut handles = Vec::new();
        for i in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .insert("Shared boilerplate", &format!("译文{}", i), true)
                    .await
            }));
        }

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() == InsertOutcome::Inserted {
                inserted += 1;
            }
        }

        assert_eq!(inserted, 1);
        assert_eq!(cache.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_dump_and_load() {
        let (cache, _dir) = open_temp_cache().await;
        cache.insert("b", "B", true).await.unwrap();
        cache.insert("a", "A", true).await.unwrap();

        let dumped = cache.dump().await.unwrap();
        assert_eq!(dumped, vec![entry("a", "A"), entry("b", "B")]);

        let (other, _other_dir) = open_temp_cache().await;
        other.insert("a", "kept", true).await.unwrap();

        let inserted = other.load(&dumped, false).await.unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(other.lookup("a").await.unwrap(), Some("kept".to_string()));

        let inserted = other.load(&dumped, true).await.unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(other.lookup("a").await.unwrap(), Some("A".to_string()));
    }

    #[tokio::test]
    async fn test_sqlite_rejects_legacy_schema() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("legacy.db");

        let db = Builder::new_local(&path).build().await.unwrap();
        let conn = db.connect().unwrap();
        conn.execute(
            "CREATE TABLE translations (source_text TEXT PRIMARY KEY, translated_text TEXT, formatted_text TEXT)",
            (),
        )
        .await
        .unwrap();
        drop(conn);
        drop(db);

        match SqliteCache::open(&path).await {
            Err(TranslationError::Cache { .. }) => {}
            other => panic!("expected schema error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_memory_cache() {
        let cache = MemoryCache::with_entries(vec![entry("Hello", "こんにちは")]);

        assert_eq!(
            cache.lookup("Hello").await.unwrap(),
            Some("こんにちは".to_string())
        );
        assert_eq!(
            cache.insert("Hello", "other", true).await.unwrap(),
            InsertOutcome::AlreadyExists
        );
        assert_eq!(
            cache.insert("World", "世界", false).await.unwrap(),
            InsertOutcome::Inserted
        );
        assert_eq!(cache.len(), 2);
        assert!(!cache.entry("World").unwrap().is_valid);
    }

    #[test]
    fn test_entries_json_round_trip_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dump.json");

        write_entries_json(&path, &[entry("Hello", "こんにちは")]).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"sourceText\": \"Hello\""));
        assert!(content.contains("\"isValid\": true"));

        let entries = read_entries_json(&path).unwrap();
        assert_eq!(entries, vec![entry("Hello", "こんにちは")]);
    }

    #[test]
    fn test_entries_json_without_validity_flag() {
        let json = r#"[{"sourceText": "a", "translatedText": "b"}]"#;
        let entries: Vec<CacheEntry> = serde_json::from_str(json).unwrap();
        assert!(entries[0].is_valid);
    }
}
