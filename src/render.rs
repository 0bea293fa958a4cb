//! Markdown序列化模块
//!
//! 将块序列重新拼装为文档，有译文的块使用译文，其余保持原文。

use crate::block::{Block, BlockKind};

/// 将块序列渲染为Markdown文本
///
/// 每个块输出为 `缩进 + 标记 + 文本 + "\n"`，最终结果去掉末尾的一个换行。
/// 对未翻译的块序列，`render_blocks(parse_markdown(d))` 与 `d` 仅在末尾换行上不同。
pub fn render_blocks(blocks: &[Block]) -> String {
    let mut markdown = String::new();

    for block in blocks {
        render_block(block, &mut markdown);
    }

    if markdown.ends_with('\n') {
        markdown.pop();
    }
    markdown
}

fn render_block(block: &Block, out: &mut String) {
    let text = block.display_text();

    match &block.kind {
        BlockKind::Blank => {}
        BlockKind::Heading { level } => {
            out.push_str(&block.indent);
            out.push_str(&"#".repeat(*level));
            if !text.is_empty() {
                out.push(' ');
                out.push_str(text);
            }
        }
        BlockKind::Item => {
            out.push_str(&block.indent);
            out.push_str("- ");
            out.push_str(text);
        }
        BlockKind::OrderedItem { number } => {
            out.push_str(&block.indent);
            out.push_str(&format!("{}. ", number));
            out.push_str(text);
        }
        BlockKind::CodeBlock { lang, body_lines } => {
            out.push_str(&block.indent);
            out.push_str("```");
            out.push_str(lang);
            out.push('\n');
            if *body_lines > 0 || !text.is_empty() {
                out.push_str(text);
                out.push('\n');
            }
            out.push_str(&block.indent);
            out.push_str("```");
        }
        BlockKind::Paragraph | BlockKind::Image | BlockKind::Table | BlockKind::Other => {
            out.push_str(&block.indent);
            out.push_str(text);
        }
    }

    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_markdown;

    fn round_trip(doc: &str) -> String {
        render_blocks(&parse_markdown(doc).unwrap())
    }

    #[test]
    fn test_render_untranslated() {
        assert_eq!(round_trip("# Hello\n\nWorld\n"), "# Hello\n\nWorld");
    }

    #[test]
    fn test_render_translated() {
        let mut blocks = parse_markdown("# Hello\n\nWorld\n").unwrap();
        blocks[0].translated_text = Some("こんにちは".to_string());
        blocks[2].translated_text = Some("世界".to_string());

        assert_eq!(render_blocks(&blocks), "# こんにちは\n\n世界");
    }

    #[test]
    fn test_indent_preserved() {
        assert_eq!(round_trip("  - item one\n"), "  - item one");
        assert_eq!(round_trip("\t\t- tabbed"), "\t\t- tabbed");
    }

    #[test]
    fn test_round_trip_identity() {
        let doc = "\
# Title

Intro paragraph with `inline` code.

## Section

- first
  - nested
    - deeper
1. one
2. two
   10. ten

```go
# comment inside code
- also not an item

func main() {}
```

![diagram](img/diagram.png)

```

```

| Name | Value |
|------|-------|
| a    | 1     |

    ```
    indented fence
    ```
Closing words.";

        assert_eq!(round_trip(doc), doc);
        assert_eq!(round_trip(&format!("{}\n", doc)), doc);
    }

    #[test]
    fn test_code_fence_body_lines() {
        assert_eq!(round_trip("```\n```"), "```\n```");
        assert_eq!(round_trip("```\n\n```"), "```\n\n```");
        assert_eq!(round_trip("```text\n\n\n```"), "```text\n\n\n```");
    }

    #[test]
    fn test_indented_table_rows() {
        assert_eq!(round_trip("  | a |\n  | b |"), "  | a |\n  | b |");
        assert_eq!(round_trip("| a |\n   | b |\nafter"), "| a |\n   | b |\nafter");
    }

    #[test]
    fn test_trailing_blank_lines() {
        assert_eq!(round_trip("text\n\n"), "text\n");
    }

    #[test]
    fn test_code_block_translation_replaces_body_only() {
        let mut blocks = parse_markdown("```sh\necho hi\n```").unwrap();
        blocks[0].translated_text = Some("echo こんにちは".to_string());
        assert_eq!(render_blocks(&blocks), "```sh\necho こんにちは\n```");
    }

    #[test]
    fn test_table_translation() {
        let mut blocks = parse_markdown("| Name |\n|---|").unwrap();
        blocks[0].translated_text = Some("| 名前 |\n|---|".to_string());
        assert_eq!(render_blocks(&blocks), "| 名前 |\n|---|");
    }

    #[test]
    fn test_empty_sequence() {
        assert_eq!(render_blocks(&[]), "");
    }
}
