//! Outline Commands

use uuid::Uuid;

/// 从头起草大纲命令
///
/// 大纲行不存在时创建，存在时原地覆盖（已批准的大纲除外）。
#[derive(Debug, Clone)]
pub struct DraftOutline {
    pub book_id: Uuid,
    pub notes: String,
}

/// 带编辑反馈修订大纲命令
#[derive(Debug, Clone)]
pub struct ReviseOutline {
    pub book_id: Uuid,
    pub feedback: String,
}

/// 批准大纲命令（解析章节的唯一触发点）
#[derive(Debug, Clone)]
pub struct ApproveOutline {
    pub book_id: Uuid,
}

/// 重新解析章节命令（解析零章节后的重试入口）
#[derive(Debug, Clone)]
pub struct ReparseChapters {
    pub book_id: Uuid,
}
