//! Context Assembler - 生成上下文压缩
//!
//! 为目标章节构造有界的前文上下文: 只收集编号严格小于目标、
//! 已批准且有摘要的章节，拼成 "Chapter <n> Summary: <s>" 行。
//! 上下文只由压缩后的摘要构成，从不回放整章原文，
//! 这使提示词体积不随书的长度增长。

use super::workflow::ChapterStatus;

/// 组装上下文所需的最小章节视图
#[derive(Debug, Clone)]
pub struct ChapterBrief<'a> {
    pub number: u32,
    pub status: ChapterStatus,
    pub summary: Option<&'a str>,
}

/// 为 `target_number` 章组装前文上下文
///
/// 返回按章节编号升序、换行分隔的摘要行。
/// 没有任何前文摘要时返回空串，调用方需要显式告知后端这是第一章。
pub fn assemble_context(chapters: &[ChapterBrief<'_>], target_number: u32) -> String {
    let mut prior: Vec<&ChapterBrief<'_>> = chapters
        .iter()
        .filter(|c| c.number < target_number)
        .filter(|c| c.status.is_approved())
        .filter(|c| c.summary.is_some_and(|s| !s.trim().is_empty()))
        .collect();
    prior.sort_by_key(|c| c.number);

    prior
        .iter()
        .map(|c| format!("Chapter {} Summary: {}", c.number, c.summary.unwrap_or_default()))
        .collect::<Vec<_>>()
        .join("\n")
}
