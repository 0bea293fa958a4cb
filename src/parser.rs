//! Markdown块解析模块
//!
//! 单遍、按行、有状态的解析器。每一行按固定优先级归类：
//! 空行、标题、无序列表项、有序列表项、代码围栏、图片、表格行，其余进入段落缓冲。
//! 除表格结束需要向前看一行外不回溯，也不递归。

// 标准库导入
use std::sync::LazyLock;

// 第三方crate导入
use regex::Regex;
use tracing::debug;

// 本地模块导入
use crate::block::{Block, BlockKind};
use crate::error::Result;
use crate::translation_error;

static ORDERED_ITEM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.\s").expect("有序列表正则表达式无效"));

const FENCE: &str = "```";

/// 解析Markdown文档为有序的块序列
///
/// 有序列表项编号无法解析为整数（例如超出范围）时立即返回错误，不产生部分结果。
///
/// # Examples
///
/// ```rust
/// use md_translator::parser::parse_markdown;
/// use md_translator::block::BlockKind;
///
/// let blocks = parse_markdown("# Hello\n\nWorld\n").unwrap();
/// assert_eq!(blocks.len(), 3);
/// assert_eq!(blocks[0].kind, BlockKind::Heading { level: 1 });
/// assert_eq!(blocks[2].source_text, "World");
/// ```
pub fn parse_markdown(document: &str) -> Result<Vec<Block>> {
    let lines: Vec<&str> = document.lines().collect();
    let mut parser = BlockParser::default();

    for (index, line) in lines.iter().enumerate() {
        let next = lines.get(index + 1).copied();
        parser.feed(index, line, next)?;
    }

    let blocks = parser.finish(lines.len());
    debug!("解析完成: {} 行 -> {} 个块", lines.len(), blocks.len());
    Ok(blocks)
}

/// 打开中的代码围栏
struct OpenFence<'a> {
    indent: &'a str,
    lang: String,
    start: usize,
    lines: Vec<&'a str>,
}

/// 待输出的表格行
struct PendingTable<'a> {
    indent: &'a str,
    start: usize,
    rows: Vec<&'a str>,
}

#[derive(Default)]
struct BlockParser<'a> {
    blocks: Vec<Block>,
    paragraph: Vec<&'a str>,
    paragraph_start: usize,
    fence: Option<OpenFence<'a>>,
    table: Option<PendingTable<'a>>,
}

impl<'a> BlockParser<'a> {
    fn feed(&mut self, index: usize, line: &'a str, next: Option<&'a str>) -> Result<()> {
        // 代码块内部的行原样收集，不参与其他规则
        if self.fence.is_some() {
            if is_closing_fence(line) {
                if let Some(fence) = self.fence.take() {
                    self.blocks.push(fence.into_block());
                }
            } else if let Some(fence) = self.fence.as_mut() {
                fence.lines.push(line);
            }
            return Ok(());
        }

        let trimmed = line.trim();
        let indent = leading_whitespace(line);

        if trimmed.is_empty() {
            self.flush_paragraph();
            self.blocks.push(Block::blank(index));
            return Ok(());
        }

        if trimmed.starts_with('#') {
            self.flush_paragraph();
            self.blocks.push(parse_heading(trimmed, indent, index));
        } else if trimmed.starts_with("- ") {
            self.flush_paragraph();
            let text = trimmed[1..].trim();
            self.blocks.push(Block::new(BlockKind::Item, text, indent, index));
        } else if ORDERED_ITEM_REGEX.is_match(trimmed) {
            self.flush_paragraph();
            self.blocks.push(parse_ordered_item(trimmed, indent, index)?);
        } else if trimmed.starts_with(FENCE) {
            self.flush_paragraph();
            self.fence = Some(OpenFence {
                indent,
                lang: trimmed[FENCE.len()..].trim().to_string(),
                start: index,
                lines: Vec::new(),
            });
        } else if trimmed.starts_with('!') {
            self.flush_paragraph();
            self.blocks.push(Block::new(BlockKind::Image, trimmed, indent, index));
        } else if is_table_line(trimmed) {
            self.flush_paragraph();
            let table = self.table.get_or_insert_with(|| PendingTable {
                indent,
                start: index,
                rows: Vec::new(),
            });
            // 首行缩进单独保存，后续行保留原始缩进
            let row = if table.rows.is_empty() { line.trim_start() } else { line };
            table.rows.push(row);

            // 向前看一行：下一行不是表格行（或已到结尾）时结束表格
            let continues = next.is_some_and(|n| is_table_line(n.trim()));
            if !continues {
                if let Some(table) = self.table.take() {
                    self.blocks.push(table.into_block());
                }
            }
        } else {
            if self.paragraph.is_empty() {
                self.paragraph_start = index;
            }
            self.paragraph.push(line);
        }

        Ok(())
    }

    fn flush_paragraph(&mut self) {
        if self.paragraph.is_empty() {
            return;
        }

        let text = self.paragraph.join(" ");
        let indent = leading_whitespace(&text);
        self.blocks.push(Block::new(
            BlockKind::Paragraph,
            text.trim(),
            indent,
            self.paragraph_start,
        ));
        self.paragraph.clear();
    }

    fn finish(mut self, line_count: usize) -> Vec<Block> {
        if let Some(fence) = self.fence.take() {
            debug!("代码块未闭合 (起始第{}行)，延伸至文档结尾", fence.start + 1);
            self.blocks.push(fence.into_block());
        }
        if let Some(table) = self.table.take() {
            self.blocks.push(table.into_block());
        }
        self.flush_paragraph();

        debug_assert!(self.blocks.iter().all(|b| b.position <= line_count));
        self.blocks
    }
}

impl OpenFence<'_> {
    fn into_block(self) -> Block {
        Block::new(
            BlockKind::CodeBlock {
                lang: self.lang,
                body_lines: self.lines.len(),
            },
            self.lines.join("\n"),
            self.indent,
            self.start,
        )
    }
}

impl PendingTable<'_> {
    fn into_block(self) -> Block {
        Block::new(BlockKind::Table, self.rows.join("\n"), self.indent, self.start)
    }
}

/// 解析标题行（已去除首尾空白）
///
/// 逐个统计 `#`，遇到后面紧跟空格的 `#` 或第一个非 `#` 字符时停止
fn parse_heading(trimmed: &str, indent: &str, index: usize) -> Block {
    let bytes = trimmed.as_bytes();
    let mut level = 0;
    while level < bytes.len() && bytes[level] == b'#' {
        level += 1;
        if bytes.get(level) == Some(&b' ') {
            break;
        }
    }

    let text = trimmed[level..].trim();
    Block::new(BlockKind::Heading { level }, text, indent, index)
}

/// 解析有序列表项（已去除首尾空白，且已匹配 `^[0-9]+\.\s`）
fn parse_ordered_item(trimmed: &str, indent: &str, index: usize) -> Result<Block> {
    let dot = trimmed.find('.').unwrap_or(trimmed.len());
    let digits = &trimmed[..dot];

    let number = digits.parse::<u64>().map_err(|e| {
        translation_error!(parse, index, format!("有序列表编号 '{}' 无效: {}", digits, e))
    })?;

    let text = trimmed.get(dot + 1..).unwrap_or("").trim();
    Ok(Block::new(BlockKind::OrderedItem { number }, text, indent, index))
}

fn is_table_line(trimmed: &str) -> bool {
    trimmed.starts_with('|')
}

fn is_closing_fence(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= FENCE.len() && trimmed.chars().all(|c| c == '`')
}

fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}
