//! 翻译目标筛选模块
//!
//! 决定哪些块需要送去翻译，并支持把翻译目标按字节上限打包成带索引的批次文本。

// 标准库导入
use std::sync::LazyLock;

// 第三方crate导入
use regex::Regex;

// 本地模块导入
use crate::block::Block;

static ENGLISH_WORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-zA-Z]+\b").expect("英文单词正则表达式无效"));

/// 判断文本是否包含至少一个英文单词
pub fn contains_english_words(text: &str) -> bool {
    ENGLISH_WORD_REGEX.is_match(text)
}

/// 判断块是否值得翻译：类型可翻译且包含英文单词
pub fn is_eligible(block: &Block) -> bool {
    block.kind.is_translatable() && contains_english_words(&block.source_text)
}

/// 选出需要翻译的块的下标
pub fn select_targets(blocks: &[Block]) -> Vec<usize> {
    blocks
        .iter()
        .enumerate()
        .filter(|(_, block)| is_eligible(block))
        .map(|(index, _)| index)
        .collect()
}

/// 把可翻译类型的块按 `[下标]原文\n` 的格式打包成批次
///
/// 每个批次的字节数不超过 `byte_limit`；单行超过上限时独占一个批次。
/// 这里不做英文过滤，所有可翻译类型的块都会输出。
pub fn extract_target_batches(blocks: &[Block], byte_limit: usize) -> Vec<String> {
    let mut batches = Vec::new();
    let mut current = String::new();

    for (index, block) in blocks.iter().enumerate() {
        if !block.kind.is_translatable() {
            continue;
        }

        let line = format!("[{}]{}\n", index, block.source_text);
        if !current.is_empty() && current.len() + line.len() > byte_limit {
            batches.push(std::mem::take(&mut current));
        }
        current.push_str(&line);
    }

    if !current.is_empty() {
        batches.push(current);
    }

    batches
}
