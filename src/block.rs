//! Markdown块模型
//!
//! 一个 [`Block`] 表示文档中的一个结构单元。块由解析器一次性创建，
//! 之后唯一会被修改的字段是 `translated_text`。

use std::fmt;

/// 块类型
///
/// 固定的封闭集合，解析器和序列化器都对其做穷尽匹配
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    /// 标题，`level` 为行首 `#` 的个数
    Heading { level: usize },
    /// 段落
    Paragraph,
    /// 无序列表项 (`- `)
    Item,
    /// 有序列表项 (`1. `)
    OrderedItem { number: u64 },
    /// 围栏代码块，`lang` 为开头围栏后的信息字符串，
    /// `body_lines` 为两道围栏之间的行数（区分空代码块与只含一个空行的代码块）
    CodeBlock { lang: String, body_lines: usize },
    /// 图片（单行）
    Image,
    /// 连续的 `|` 表格行
    Table,
    /// 空行
    Blank,
    /// 其他元素
    Other,
}

impl BlockKind {
    /// 类型名称，用于诊断输出
    pub fn name(&self) -> &'static str {
        match self {
            BlockKind::Heading { .. } => "Heading",
            BlockKind::Paragraph => "Paragraph",
            BlockKind::Item => "Item",
            BlockKind::OrderedItem { .. } => "OrderedItem",
            BlockKind::CodeBlock { .. } => "CodeBlock",
            BlockKind::Image => "Image",
            BlockKind::Table => "Table",
            BlockKind::Blank => "Blank",
            BlockKind::Other => "Other",
        }
    }

    /// 该类型的文本是否属于可翻译的自然语言内容
    pub fn is_translatable(&self) -> bool {
        matches!(
            self,
            BlockKind::Heading { .. }
                | BlockKind::Paragraph
                | BlockKind::Item
                | BlockKind::OrderedItem { .. }
                | BlockKind::Table
        )
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 文档结构块
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// 块类型
    pub kind: BlockKind,
    /// 原始文本片段
    pub source_text: String,
    /// 译文，由缓存或翻译任务填充
    pub translated_text: Option<String>,
    /// 标记之前的原始缩进字符（原样保留，不假设全是空格）
    pub indent: String,
    /// 识别出该块的源文件行号（从0开始）
    pub position: usize,
}

impl Block {
    /// 创建未翻译的块
    pub fn new(kind: BlockKind, source_text: impl Into<String>, indent: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            source_text: source_text.into(),
            translated_text: None,
            indent: indent.into(),
            position,
        }
    }

    /// 空行块
    pub fn blank(position: usize) -> Self {
        Self::new(BlockKind::Blank, "", "", position)
    }

    /// 缩进宽度（字符数）
    pub fn indent_width(&self) -> usize {
        self.indent.chars().count()
    }

    /// 标题级别，非标题返回 `None`
    pub fn heading_level(&self) -> Option<usize> {
        match self.kind {
            BlockKind::Heading { level } => Some(level),
            _ => None,
        }
    }

    /// 有序列表编号，非有序列表项返回 `None`
    pub fn ordered_item_number(&self) -> Option<u64> {
        match self.kind {
            BlockKind::OrderedItem { number } => Some(number),
            _ => None,
        }
    }

    /// 渲染时使用的文本：非空译文优先，否则为原文
    pub fn display_text(&self) -> &str {
        match self.translated_text.as_deref() {
            Some(text) if !text.is_empty() => text,
            _ => &self.source_text,
        }
    }

    pub fn is_translated(&self) -> bool {
        self.translated_text.as_deref().is_some_and(|t| !t.is_empty())
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{Line:{} Type:{} Text:{} IndentWidth:{} HeadingLevel:{}}}",
            self.position,
            self.kind,
            self.source_text,
            self.indent_width(),
            self.heading_level().unwrap_or(0)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_text_prefers_translation() {
        let mut block = Block::new(BlockKind::Paragraph, "World", "", 0);
        assert_eq!(block.display_text(), "World");
        assert!(!block.is_translated());

        block.translated_text = Some(String::new());
        assert_eq!(block.display_text(), "World");

        block.translated_text = Some("世界".to_string());
        assert_eq!(block.display_text(), "世界");
        assert!(block.is_translated());
    }

    #[test]
    fn test_indent_width_counts_characters() {
        let block = Block::new(BlockKind::Item, "x", "\t  ", 3);
        assert_eq!(block.indent_width(), 3);
    }

    #[test]
    fn test_translatable_kinds() {
        assert!(BlockKind::Heading { level: 2 }.is_translatable());
        assert!(BlockKind::Table.is_translatable());
        assert!(!BlockKind::CodeBlock { lang: String::new(), body_lines: 0 }.is_translatable());
        assert!(!BlockKind::Image.is_translatable());
        assert!(!BlockKind::Blank.is_translatable());
    }

    #[test]
    fn test_block_display() {
        let block = Block::new(BlockKind::Heading { level: 2 }, "Intro", "", 7);
        assert_eq!(
            block.to_string(),
            "{Line:7 Type:Heading Text:Intro IndentWidth:0 HeadingLevel:2}"
        );
    }
}
