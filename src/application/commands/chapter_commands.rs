//! Chapter Commands

use uuid::Uuid;

/// 生成下一章命令
///
/// 目标章节由当前状态推导（编号最小的未批准章节），不由调用方指定。
#[derive(Debug, Clone)]
pub struct GenerateNextChapter {
    pub book_id: Uuid,
    /// 本章的作者批注（可为空）
    pub notes: String,
}

/// 批准章节命令（触发摘要生成）
#[derive(Debug, Clone)]
pub struct ApproveChapter {
    pub chapter_id: Uuid,
}

/// 带批注重写章节命令
#[derive(Debug, Clone)]
pub struct RegenerateChapter {
    pub chapter_id: Uuid,
    pub notes: String,
}
