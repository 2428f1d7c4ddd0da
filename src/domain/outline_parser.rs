//! Outline Parser - 大纲启发式解析
//!
//! 从自由文本大纲中提取章节候选列表。LLM 输出的大纲格式并不稳定，
//! 解析器需要容忍常见的几种排版:
//! - "Chapter 1: The Beginning"
//! - "1. The Beginning"
//! - "**Chapter 1**: The Beginning"
//! - "## Chapter 1: The Beginning"
//!
//! 章节编号按标题行出现的顺序重新分配为 1..N，
//! 原文中嵌入的数字只用于识别标题行，数值本身被丢弃。

use once_cell::sync::Lazy;
use regex::Regex;

/// 章节标题行:
/// 可选的 markdown 强调前缀（#/*），然后是 "chapter <n>"（大小写不敏感）
/// 或者行首 "<n>."
static HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:[#*]+\s*)?(?:chapter\s+(\d+)|(\d+)\.)").unwrap()
});

/// 解析出的章节候选
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedChapter {
    /// 位置编号，从 1 开始
    pub number: u32,
    pub title: String,
}

/// 解析大纲文本，返回按出现顺序编号的章节候选列表
///
/// 没有匹配到任何标题行时返回空列表，由调用方决定如何提示。
pub fn parse_outline(content: &str) -> Vec<ParsedChapter> {
    let mut chapters = Vec::new();

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let Some(caps) = HEADING.captures(line) else {
            continue;
        };

        let number = chapters.len() as u32 + 1;
        chapters.push(ParsedChapter {
            number,
            title: extract_title(line, &caps),
        });
    }

    chapters
}

/// 标题提取:
/// 1. 行内有冒号 -> 取第一个冒号之后的部分
/// 2. 匹配到 "<n>." 前缀 -> 取前缀之后的部分
/// 3. 兜底 -> 整行
/// 最后剥掉残留的 '*' 强调符。
fn extract_title(line: &str, caps: &regex::Captures<'_>) -> String {
    let title = if let Some(idx) = line.find(':') {
        &line[idx + 1..]
    } else if caps.get(2).is_some() {
        // 正则保证 group 0 以 "<n>." 结尾
        &line[caps.get(0).map(|m| m.end()).unwrap_or(0)..]
    } else {
        line
    };

    title.replace('*', "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(content: &str) -> Vec<(u32, String)> {
        parse_outline(content)
            .into_iter()
            .map(|c| (c.number, c.title))
            .collect()
    }

    #[test]
    fn test_sequential_renumbering_discards_embedded_numbers() {
        let outline =
            "Chapter 1: The Start\nsome body text\n## Chapter 2: Rising Action\nChapter 9: Finale";
        assert_eq!(
            titles(outline),
            vec![
                (1, "The Start".to_string()),
                (2, "Rising Action".to_string()),
                (3, "Finale".to_string()),
            ]
        );
    }

    #[test]
    fn test_numeric_prefix_format() {
        let outline = "1. The Beginning\n2. The Middle\n3. The End";
        assert_eq!(
            titles(outline),
            vec![
                (1, "The Beginning".to_string()),
                (2, "The Middle".to_string()),
                (3, "The End".to_string()),
            ]
        );
    }

    #[test]
    fn test_markdown_emphasis_is_stripped() {
        let outline = "**Chapter 1**: The Beginning\n## Chapter 2: Echoes";
        assert_eq!(
            titles(outline),
            vec![
                (1, "The Beginning".to_string()),
                (2, "Echoes".to_string()),
            ]
        );
    }

    #[test]
    fn test_chapter_word_is_case_insensitive() {
        let outline = "CHAPTER 1: Loud\nchapter 2: quiet";
        assert_eq!(
            titles(outline),
            vec![(1, "Loud".to_string()), (2, "quiet".to_string())]
        );
    }

    #[test]
    fn test_body_lines_are_ignored() {
        let outline = "Introduction\nChapter 1: Only One\nA short description here.\nNotes: none";
        // "Notes: none" 不以 chapter/数字开头，不是标题行
        assert_eq!(titles(outline), vec![(1, "Only One".to_string())]);
    }

    #[test]
    fn test_no_colon_falls_back_to_whole_line() {
        let outline = "Chapter 1 The Untitled";
        assert_eq!(titles(outline), vec![(1, "Chapter 1 The Untitled".to_string())]);
    }

    #[test]
    fn test_zero_headings_is_empty_not_error() {
        assert!(parse_outline("just prose\nno headings at all").is_empty());
        assert!(parse_outline("").is_empty());
    }

    #[test]
    fn test_mixed_formats_in_one_outline() {
        let outline = "# Outline\nChapter 1: One\n2. Two\n**Chapter 7: Seven**";
        assert_eq!(
            titles(outline),
            vec![
                (1, "One".to_string()),
                (2, "Two".to_string()),
                (3, "Seven".to_string()),
            ]
        );
    }
}
