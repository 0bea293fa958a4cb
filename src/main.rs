use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use md_translator::api_constants::pipeline_config;
use md_translator::block::Block;
use md_translator::cache::{
    read_entries_json, write_entries_json, MemoryCache, SqliteCache, TranslationCache,
};
use md_translator::config::{
    CacheCommand, Cli, Command, ExtractArgs, MergeArgs, ParseArgs, TranslateArgs,
};
use md_translator::coordinator::TranslationCoordinator;
use md_translator::filter::{extract_target_batches, select_targets};
use md_translator::parser::parse_markdown;
use md_translator::render::render_blocks;
use md_translator::stats::{format_duration, print_performance_stats, RunStats};
use md_translator::translator::HttpTranslator;
use md_translator::utils::{
    generate_output_path, init_logging, merge_markdown_files, validate_input_file,
};

/// 部分块翻译失败（`--keep-going`）时的退出码
const EXIT_PARTIAL_FAILURE: i32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志系统
    init_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Command::Translate(args) => run_translate(args, cli.verbose).await,
        Command::Parse(args) => run_parse(args).map(|_| true),
        Command::Extract(args) => run_extract(args).map(|_| true),
        Command::Merge(args) => run_merge(args).map(|_| true),
        Command::Cache(command) => run_cache(command).await.map(|_| true),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(EXIT_PARTIAL_FAILURE),
        Err(e) => {
            error!("❌ 执行失败: {:#}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

/// 翻译一个Markdown文件，返回是否所有目标块都翻译成功
async fn run_translate(args: &TranslateArgs, verbose: bool) -> Result<bool> {
    validate_input_file(&args.input)?;

    let output_path = generate_output_path(&args.input, args.output.as_deref(), &args.lang);

    info!("🚀 启动Markdown翻译");
    info!("📂 输入文件: {}", args.input.display());
    info!("📄 输出文件: {}", output_path.display());
    info!("🌐 目标语言: {}", args.lang);

    let total_start = Instant::now();
    let mut stats = RunStats::default();

    let content = read_file(&args.input)?;
    stats.input_size = content.len();

    let parse_start = Instant::now();
    let mut blocks = parse_markdown(&content).context("解析Markdown失败")?;
    stats.parse_time = parse_start.elapsed();
    stats.blocks_parsed = blocks.len();

    if args.print_nodes {
        print_blocks(&blocks);
    }

    let targets = select_targets(&blocks);
    stats.blocks_targeted = targets.len();
    info!("🧩 解析出 {} 个块，其中 {} 个需要翻译", blocks.len(), targets.len());

    let cache_start = Instant::now();
    let cache: Arc<dyn TranslationCache> = if args.no_cache {
        info!("💾 持久化缓存已禁用");
        Arc::new(MemoryCache::new())
    } else {
        let cache = SqliteCache::open(&args.cache)
            .await
            .with_context(|| format!("打开翻译缓存失败: {}", args.cache.display()))?;
        info!("💾 翻译缓存: {}", cache.path().display());
        Arc::new(cache)
    };
    stats.cache_open_time = cache_start.elapsed();

    let translator =
        Arc::new(HttpTranslator::new(args.translator_config()).context("创建翻译服务失败")?);

    let translate_start = Instant::now();
    let report = TranslationCoordinator::new(cache, translator)
        .with_concurrency(args.concurrency)
        .with_failure_policy(args.failure_policy())
        .translate_all(&mut blocks, &targets)
        .await
        .context("翻译失败")?;
    stats.translation_time = translate_start.elapsed();

    for failure in &report.failures {
        warn!(
            "⚠️  第{}行未翻译，保留原文: {}",
            failure.position + 1,
            failure.message
        );
    }

    let render_start = Instant::now();
    let translated = render_blocks(&blocks);
    stats.render_time = render_start.elapsed();
    stats.output_size = translated.len();

    let write_start = Instant::now();
    std::fs::write(&output_path, &translated)
        .with_context(|| format!("写入文件失败: {}", output_path.display()))?;
    stats.file_write_time = write_start.elapsed();

    let all_translated = !report.has_failures();
    stats.report = report;

    let total_duration = total_start.elapsed();
    info!("✅ 翻译完成！总耗时: {}", format_duration(total_duration));

    if args.stats || verbose {
        print_performance_stats(&stats, total_duration);
    }

    Ok(all_translated)
}

/// 解析文件并打印所有块
fn run_parse(args: &ParseArgs) -> Result<()> {
    validate_input_file(&args.input)?;

    let content = read_file(&args.input)?;
    let blocks = parse_markdown(&content).context("解析Markdown失败")?;
    print_blocks(&blocks);

    let summary = RunStats::kind_counts(&blocks)
        .iter()
        .map(|(name, count)| format!("{}={}", name, count))
        .collect::<Vec<_>>()
        .join(", ");
    info!("🧩 共 {} 个块: {}", blocks.len(), summary);

    if let Some(path) = &args.roundtrip {
        let rendered = render_blocks(&blocks);
        std::fs::write(path, &rendered)
            .with_context(|| format!("写入文件失败: {}", path.display()))?;

        if rendered == content.strip_suffix('\n').unwrap_or(&content) {
            info!("🔁 往返结果与原文一致: {}", path.display());
        } else {
            warn!("⚠️  往返结果与原文不同（空白已规范化）: {}", path.display());
        }
    }

    Ok(())
}

/// 导出分批的翻译目标文本，每个批次写入 `<out_dir>/<序号>.txt`
fn run_extract(args: &ExtractArgs) -> Result<()> {
    validate_input_file(&args.input)?;

    if args.batch_bytes == 0 {
        anyhow::bail!("批次字节上限必须大于0");
    }

    let content = read_file(&args.input)?;
    let blocks = parse_markdown(&content).context("解析Markdown失败")?;
    let batches = extract_target_batches(&blocks, args.batch_bytes);

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("创建目录失败: {}", args.out_dir.display()))?;

    for (i, batch) in batches.iter().enumerate() {
        let path = args.out_dir.join(format!("{}.txt", i));
        std::fs::write(&path, batch)
            .with_context(|| format!("写入文件失败: {}", path.display()))?;
    }

    info!("📦 导出 {} 个批次到 {}", batches.len(), args.out_dir.display());
    Ok(())
}

/// 合并目录下的Markdown文件
fn run_merge(args: &MergeArgs) -> Result<()> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input_dir.join(pipeline_config::MERGED_FILE_NAME));

    let merged = merge_markdown_files(&args.input_dir, Some(&output))?;
    std::fs::write(&output, &merged)
        .with_context(|| format!("写入文件失败: {}", output.display()))?;

    info!("📚 合并完成: {} ({} 字节)", output.display(), merged.len());
    Ok(())
}

async fn run_cache(command: &CacheCommand) -> Result<()> {
    match command {
        CacheCommand::Dump { cache, output } => {
            let cache = SqliteCache::open(cache).await?;
            let entries = cache.dump().await?;
            write_entries_json(output, &entries)?;
            info!("📤 导出 {} 条缓存到 {}", entries.len(), output.display());
        }
        CacheCommand::Load {
            input,
            cache,
            replace,
        } => {
            let entries = read_entries_json(input)?;
            let cache = SqliteCache::open(cache).await?;
            cache.load(&entries, *replace).await?;
        }
    }

    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("读取文件失败: {}", path.display()))
}

fn print_blocks(blocks: &[Block]) {
    for block in blocks {
        println!("{}", block);
    }
}
