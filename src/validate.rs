//! 译文结构校验
//!
//! 校验结果只作记录（写入缓存的有效性标记），不阻止译文被使用。

use pulldown_cmark::{Event, Options, Parser, Tag};

/// 检查文本能否作为结构完整的Markdown片段解析
///
/// 要求：非空、代码围栏成对、块级标签开闭平衡
pub fn is_valid_markdown(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }

    let fences = text
        .lines()
        .filter(|line| line.trim_start().starts_with("```"))
        .count();
    if fences % 2 != 0 {
        return false;
    }

    let mut depth: i64 = 0;
    for event in Parser::new_ext(text, Options::ENABLE_TABLES) {
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// 校验译文：自身结构有效，且顶层块类型序列与原文一致
///
/// 例如原文是普通段落而译文多出了 `# `，会被判定为无效
pub fn validate_translation(source: &str, translated: &str) -> bool {
    is_valid_markdown(translated) && top_level_blocks(source) == top_level_blocks(translated)
}

fn top_level_blocks(text: &str) -> Vec<&'static str> {
    let mut blocks = Vec::new();
    let mut depth = 0usize;

    for event in Parser::new_ext(text, Options::ENABLE_TABLES) {
        match event {
            Event::Start(tag) => {
                if depth == 0 {
                    blocks.push(block_name(&tag));
                }
                depth += 1;
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    blocks
}

fn block_name(tag: &Tag<'_>) -> &'static str {
    match tag {
        Tag::Paragraph { .. } => "paragraph",
        Tag::Heading { .. } => "heading",
        Tag::BlockQuote { .. } => "blockquote",
        Tag::CodeBlock { .. } => "code",
        Tag::List { .. } => "list",
        Tag::Table { .. } => "table",
        Tag::HtmlBlock { .. } => "html",
        _ => "other",
    }
}
