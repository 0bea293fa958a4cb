//! 翻译协调模块
//!
//! 为每个目标块启动一个翻译任务，用计数信号量限制同时进行的任务数量。
//! 每个任务先查缓存，未命中才调用翻译服务，然后把译文写回缓存。
//!
//! 任务之间没有顺序保证；所有任务结束（汇合）之后才会把译文写回块序列，
//! 每个块只由一个任务负责，缓存是唯一的共享可变资源。

// 标准库导入
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// 第三方crate导入
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

// 本地模块导入
use crate::api_constants::pipeline_config;
use crate::block::Block;
use crate::cache::{InsertOutcome, TranslationCache};
use crate::error::{Result, TranslationError};
use crate::translation_error;
use crate::translator::Translator;
use crate::validate::validate_translation;

/// 任务失败时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// 任一任务失败即终止全部任务并返回错误，不产生任何输出
    #[default]
    Abort,
    /// 记录失败的块并继续，失败的块保留原文
    Collect,
}

/// 共享进度计数器
///
/// 每个成功完成的任务（无论缓存命中与否）恰好加一
#[derive(Debug, Clone)]
pub struct Progress {
    completed: Arc<AtomicUsize>,
    total: usize,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            completed: Arc::new(AtomicUsize::new(0)),
            total,
        }
    }

    /// 记录一个完成的任务，返回当前完成数
    pub fn increment(&self) -> usize {
        self.completed.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

/// 单个块的翻译失败记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeFailure {
    /// 块在序列中的下标
    pub index: usize,
    /// 块在源文件中的行号
    pub position: usize,
    /// 错误信息
    pub message: String,
}

/// 一次翻译运行的结果统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationReport {
    /// 目标块数量
    pub total: usize,
    /// 成功完成的任务数
    pub completed: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    /// 结构校验未通过但仍被使用的译文数量
    pub invalid_translations: usize,
    /// 插入缓存时发现已被其他任务写入的次数
    pub duplicate_inserts: usize,
    /// 失败的块（仅在 [`FailurePolicy::Collect`] 下出现）
    pub failures: Vec<NodeFailure>,
}

impl TranslationReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// 单个任务的结果
#[derive(Debug)]
enum TaskOutcome {
    Hit(String),
    Miss {
        translated: String,
        is_valid: bool,
        duplicate: bool,
    },
}

/// 翻译协调器
pub struct TranslationCoordinator {
    cache: Arc<dyn TranslationCache>,
    translator: Arc<dyn Translator>,
    concurrency: usize,
    failure_policy: FailurePolicy,
}

impl TranslationCoordinator {
    /// 使用默认并发数（10）和终止策略创建协调器
    pub fn new(cache: Arc<dyn TranslationCache>, translator: Arc<dyn Translator>) -> Self {
        Self {
            cache,
            translator,
            concurrency: pipeline_config::DEFAULT_CONCURRENCY,
            failure_policy: FailurePolicy::default(),
        }
    }

    /// 设置同时进行的任务上限（至少为1）
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// 设置失败处理策略
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// 翻译 `targets` 指定下标的块，把译文写入对应块的 `translated_text`
    ///
    /// 重复的下标只处理一次；越界下标直接返回错误。
    /// 在 [`FailurePolicy::Abort`] 下，第一个失败会取消所有未完成的任务并返回该错误。
    pub async fn translate_all(
        &self,
        blocks: &mut [Block],
        targets: &[usize],
    ) -> Result<TranslationReport> {
        let targets = dedup_targets(blocks, targets)?;
        let progress = Progress::new(targets.len());
        let semaphore = Arc::new(Semaphore::new(self.concurrency));

        info!(
            "🚀 开始翻译: {} 个块, 并发上限 {}",
            targets.len(),
            self.concurrency
        );

        let mut abort_handles = Vec::with_capacity(targets.len());
        let mut tasks = FuturesUnordered::new();

        for &index in &targets {
            let source = blocks[index].source_text.clone();
            let semaphore = semaphore.clone();
            let cache = self.cache.clone();
            let translator = self.translator.clone();
            let progress = progress.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| TranslationError::TaskJoin { details: e.to_string() })?;

                let outcome = run_task(&source, cache.as_ref(), translator.as_ref()).await?;
                let done = progress.increment();
                debug!("翻译进度: {}/{}", done, progress.total());
                Ok::<_, TranslationError>(outcome)
            });

            abort_handles.push(handle.abort_handle());
            tasks.push(async move { (index, handle.await) });
        }

        let mut report = TranslationReport {
            total: targets.len(),
            ..Default::default()
        };

        // 汇合：等待所有任务结束后才返回
        while let Some((index, joined)) = tasks.next().await {
            let result = joined.map_err(TranslationError::from).and_then(|r| r);

            match result {
                Ok(TaskOutcome::Hit(cached)) => {
                    report.cache_hits += 1;
                    blocks[index].translated_text = Some(cached);
                }
                Ok(TaskOutcome::Miss {
                    translated,
                    is_valid,
                    duplicate,
                }) => {
                    report.cache_misses += 1;
                    if !is_valid {
                        report.invalid_translations += 1;
                    }
                    if duplicate {
                        report.duplicate_inserts += 1;
                    }
                    blocks[index].translated_text = Some(translated);
                }
                Err(e) => match self.failure_policy {
                    FailurePolicy::Abort => {
                        for handle in &abort_handles {
                            handle.abort();
                        }
                        error!("❌ 块 {} (第{}行) 翻译失败，终止全部任务: {}", index, blocks[index].position + 1, e);
                        return Err(e);
                    }
                    FailurePolicy::Collect => {
                        warn!("⚠️  块 {} (第{}行) 翻译失败: {}", index, blocks[index].position + 1, e);
                        report.failures.push(NodeFailure {
                            index,
                            position: blocks[index].position,
                            message: e.to_string(),
                        });
                    }
                },
            }
        }

        report.completed = progress.completed();
        report.failures.sort_by_key(|f| f.index);

        info!(
            "✅ 翻译结束: 完成 {}/{}, 缓存命中 {}, 未命中 {}, 校验未通过 {}, 失败 {}",
            report.completed,
            report.total,
            report.cache_hits,
            report.cache_misses,
            report.invalid_translations,
            report.failures.len()
        );

        Ok(report)
    }
}

/// 按给定的并发上限和失败策略翻译一组块
pub async fn translate_all(
    blocks: &mut [Block],
    targets: &[usize],
    cache: Arc<dyn TranslationCache>,
    translator: Arc<dyn Translator>,
    concurrency: usize,
    failure_policy: FailurePolicy,
) -> Result<TranslationReport> {
    TranslationCoordinator::new(cache, translator)
        .with_concurrency(concurrency)
        .with_failure_policy(failure_policy)
        .translate_all(blocks, targets)
        .await
}

/// 查缓存 -> 翻译 -> 校验 -> 写缓存
async fn run_task(
    source: &str,
    cache: &dyn TranslationCache,
    translator: &dyn Translator,
) -> Result<TaskOutcome> {
    if let Some(cached) = cache.lookup(source).await? {
        return Ok(TaskOutcome::Hit(cached));
    }

    let translated = translator.translate(source).await?;

    let is_valid = validate_translation(source, &translated);
    if !is_valid {
        debug!("译文结构校验未通过（仍会使用）: {:?}", translated);
    }

    // 其他任务可能已经写入了相同的原文；保留本任务自己的译文
    let duplicate = cache.insert(source, &translated, is_valid).await? == InsertOutcome::AlreadyExists;

    Ok(TaskOutcome::Miss {
        translated,
        is_valid,
        duplicate,
    })
}

fn dedup_targets(blocks: &[Block], targets: &[usize]) -> Result<Vec<usize>> {
    let mut seen = HashSet::with_capacity(targets.len());
    let mut unique = Vec::with_capacity(targets.len());

    for &index in targets {
        if index >= blocks.len() {
            return Err(translation_error!(
                input_validation,
                index,
                format!("目标下标超出范围 (共 {} 个块)", blocks.len())
            ));
        }
        if seen.insert(index) {
            unique.push(index);
        }
    }

    Ok(unique)
}
