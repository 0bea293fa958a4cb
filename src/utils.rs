use std::path::{Path, PathBuf};

use tracing::{debug, warn, Level};
use walkdir::WalkDir;

use crate::error::Result;
use crate::translation_error;

/// 初始化日志系统
///
/// 静默模式下仍输出错误
pub fn init_logging(verbose: bool, quiet: bool) {
    tracing_subscriber::fmt()
        .with_max_level(log_level(verbose, quiet))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// 日志级别：静默优先于详细
pub fn log_level(verbose: bool, quiet: bool) -> Level {
    if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

/// 验证输入文件
pub fn validate_input_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(translation_error!(input_validation, path.display(), "输入文件不存在"));
    }

    if !path.is_file() {
        return Err(translation_error!(input_validation, path.display(), "输入路径不是文件"));
    }

    match path.extension() {
        Some(ext) if is_markdown_extension(&ext.to_string_lossy()) => {}
        Some(ext) => warn!("⚠️  文件扩展名不是Markdown: {}", ext.to_string_lossy()),
        None => warn!("⚠️  文件没有扩展名: {}", path.display()),
    }

    Ok(())
}

fn is_markdown_extension(ext: &str) -> bool {
    ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown")
}

/// 生成输出文件路径
///
/// 未指定输出时生成 `<stem>_<lang>.<ext>`，与输入文件同目录
pub fn generate_output_path(input: &Path, output: Option<&Path>, lang: &str) -> PathBuf {
    if let Some(output_path) = output {
        return output_path.to_path_buf();
    }

    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let output_name = match input.extension() {
        Some(ext) => format!("{}_{}.{}", stem, lang, ext.to_string_lossy()),
        None => format!("{}_{}.md", stem, lang),
    };

    match input.parent() {
        Some(parent) => parent.join(output_name),
        None => PathBuf::from(output_name),
    }
}

/// 收集目录下所有 `.md` 文件（递归，按路径排序）
pub fn collect_markdown_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(translation_error!(input_validation, dir.display(), "输入路径不是目录"));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| translation_error!(file_op, dir.display(), "遍历目录", e))?;

        let is_markdown = entry
            .path()
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("md"))
            .unwrap_or(false);

        if entry.file_type().is_file() && is_markdown {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// 把目录下所有Markdown文件按路径顺序拼接，每个文件后追加一个空行
///
/// `skip` 中的文件（例如合并结果本身）不参与拼接
pub fn merge_markdown_files(dir: &Path, skip: Option<&Path>) -> Result<String> {
    let mut merged = String::new();

    for path in collect_markdown_files(dir)? {
        if skip.is_some_and(|s| s == path) {
            debug!("跳过: {}", path.display());
            continue;
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| translation_error!(file_op, path.display(), "读取", e))?;
        debug!("合并: {} ({} 字节)", path.display(), content.len());

        merged.push_str(&content);
        merged.push_str("\n\n");
    }

    Ok(merged)
}
