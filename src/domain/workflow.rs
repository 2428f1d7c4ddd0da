//! Workflow Engine - 生命周期状态机
//!
//! Book / Outline / Chapter 三种实体的状态枚举与显式转移表。
//! 所有状态变更必须经过转移表校验，不在表内的转移一律拒绝。

use thiserror::Error;

/// 非法状态转移
///
/// 被拒绝的转移不产生任何状态变更，由调用方决定如何恢复。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {entity} transition: {from} -> {to}")]
pub struct TransitionError {
    pub entity: &'static str,
    pub from: &'static str,
    pub to: &'static str,
}

// ============================================================================
// Book
// ============================================================================

/// 书籍生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookStatus {
    /// 规划中（大纲起草与审阅阶段）
    Planning,
    /// 逐章写作中
    WritingChapters,
    /// 已完成（全部章节批准并编译）
    Completed,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Planning => "PLANNING",
            BookStatus::WritingChapters => "WRITING_CHAPTERS",
            BookStatus::Completed => "COMPLETED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PLANNING" => Some(BookStatus::Planning),
            "WRITING_CHAPTERS" => Some(BookStatus::WritingChapters),
            "COMPLETED" => Some(BookStatus::Completed),
            _ => None,
        }
    }

    /// 转移表:
    /// - PLANNING -> WRITING_CHAPTERS（仅由大纲批准触发）
    /// - WRITING_CHAPTERS -> COMPLETED（仅当全部章节批准）
    pub fn can_transition(self, next: BookStatus) -> bool {
        matches!(
            (self, next),
            (BookStatus::Planning, BookStatus::WritingChapters)
                | (BookStatus::WritingChapters, BookStatus::Completed)
        )
    }

    /// 校验并返回目标状态，非法转移返回 `TransitionError`
    pub fn transition(self, next: BookStatus) -> Result<BookStatus, TransitionError> {
        if self.can_transition(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                entity: "book",
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }
}

impl Default for BookStatus {
    fn default() -> Self {
        BookStatus::Planning
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Outline
// ============================================================================

/// 大纲生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineStatus {
    /// 初始草稿（尚未生成内容）
    Draft,
    /// 等待编辑审阅
    WaitingForReview,
    /// 已批准（终态，批准后不可再生成）
    Approved,
}

impl OutlineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutlineStatus::Draft => "DRAFT",
            OutlineStatus::WaitingForReview => "WAITING_FOR_REVIEW",
            OutlineStatus::Approved => "APPROVED",
        }
    }

    /// 历史数据中存在小写形式，按大小写不敏感解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "DRAFT" => Some(OutlineStatus::Draft),
            "WAITING_FOR_REVIEW" => Some(OutlineStatus::WaitingForReview),
            "APPROVED" => Some(OutlineStatus::Approved),
            _ => None,
        }
    }

    /// 转移表:
    /// - DRAFT -> WAITING_FOR_REVIEW（首次生成）
    /// - WAITING_FOR_REVIEW -> WAITING_FOR_REVIEW（带反馈重新生成）
    /// - WAITING_FOR_REVIEW -> APPROVED（终态）
    pub fn can_transition(self, next: OutlineStatus) -> bool {
        matches!(
            (self, next),
            (OutlineStatus::Draft, OutlineStatus::WaitingForReview)
                | (OutlineStatus::WaitingForReview, OutlineStatus::WaitingForReview)
                | (OutlineStatus::WaitingForReview, OutlineStatus::Approved)
        )
    }

    pub fn transition(self, next: OutlineStatus) -> Result<OutlineStatus, TransitionError> {
        if self.can_transition(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                entity: "outline",
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }
}

impl Default for OutlineStatus {
    fn default() -> Self {
        OutlineStatus::Draft
    }
}

impl std::fmt::Display for OutlineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Chapter
// ============================================================================

/// 章节生命周期状态
///
/// `Draft` 是 `WaitingForReview` 的历史别名，所有消费方必须等同对待。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterStatus {
    /// 等待首次生成
    Pending,
    /// 历史别名，等同于 WaitingForReview
    Draft,
    /// 等待编辑审阅
    WaitingForReview,
    /// 已批准（终态，批准时生成摘要）
    Approved,
}

impl ChapterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChapterStatus::Pending => "PENDING",
            ChapterStatus::Draft => "DRAFT",
            ChapterStatus::WaitingForReview => "WAITING_FOR_REVIEW",
            ChapterStatus::Approved => "APPROVED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Some(ChapterStatus::Pending),
            "DRAFT" => Some(ChapterStatus::Draft),
            "WAITING_FOR_REVIEW" => Some(ChapterStatus::WaitingForReview),
            "APPROVED" => Some(ChapterStatus::Approved),
            _ => None,
        }
    }

    /// 是否处于待审阅状态（含 DRAFT 别名）
    pub fn is_awaiting_review(self) -> bool {
        matches!(self, ChapterStatus::Draft | ChapterStatus::WaitingForReview)
    }

    pub fn is_approved(self) -> bool {
        matches!(self, ChapterStatus::Approved)
    }

    /// 转移表（DRAFT 按 WAITING_FOR_REVIEW 处理）:
    /// - PENDING -> WAITING_FOR_REVIEW（首次生成）
    /// - WAITING_FOR_REVIEW -> WAITING_FOR_REVIEW（带批注重新生成）
    /// - WAITING_FOR_REVIEW -> APPROVED（终态）
    pub fn can_transition(self, next: ChapterStatus) -> bool {
        let from = self.normalized();
        let next = next.normalized();
        matches!(
            (from, next),
            (ChapterStatus::Pending, ChapterStatus::WaitingForReview)
                | (ChapterStatus::WaitingForReview, ChapterStatus::WaitingForReview)
                | (ChapterStatus::WaitingForReview, ChapterStatus::Approved)
        )
    }

    pub fn transition(self, next: ChapterStatus) -> Result<ChapterStatus, TransitionError> {
        if self.can_transition(next) {
            Ok(next.normalized())
        } else {
            Err(TransitionError {
                entity: "chapter",
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }

    /// 折叠历史别名
    fn normalized(self) -> ChapterStatus {
        match self {
            ChapterStatus::Draft => ChapterStatus::WaitingForReview,
            other => other,
        }
    }
}

impl Default for ChapterStatus {
    fn default() -> Self {
        ChapterStatus::Pending
    }
}

impl std::fmt::Display for ChapterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_transitions() {
        assert!(BookStatus::Planning.can_transition(BookStatus::WritingChapters));
        assert!(BookStatus::WritingChapters.can_transition(BookStatus::Completed));

        assert!(!BookStatus::Planning.can_transition(BookStatus::Completed));
        assert!(!BookStatus::WritingChapters.can_transition(BookStatus::Planning));
        assert!(!BookStatus::Completed.can_transition(BookStatus::WritingChapters));
        assert!(!BookStatus::Planning.can_transition(BookStatus::Planning));
    }

    #[test]
    fn test_book_transition_error_carries_states() {
        let err = BookStatus::Completed
            .transition(BookStatus::Planning)
            .unwrap_err();
        assert_eq!(err.entity, "book");
        assert_eq!(err.from, "COMPLETED");
        assert_eq!(err.to, "PLANNING");
    }

    #[test]
    fn test_outline_transitions() {
        assert!(OutlineStatus::Draft.can_transition(OutlineStatus::WaitingForReview));
        assert!(OutlineStatus::WaitingForReview.can_transition(OutlineStatus::WaitingForReview));
        assert!(OutlineStatus::WaitingForReview.can_transition(OutlineStatus::Approved));

        // 批准是单向的，批准后不可重新生成
        assert!(!OutlineStatus::Approved.can_transition(OutlineStatus::WaitingForReview));
        assert!(!OutlineStatus::Approved.can_transition(OutlineStatus::Draft));
        assert!(!OutlineStatus::Draft.can_transition(OutlineStatus::Approved));
    }

    #[test]
    fn test_chapter_transitions() {
        assert!(ChapterStatus::Pending.can_transition(ChapterStatus::WaitingForReview));
        assert!(ChapterStatus::WaitingForReview.can_transition(ChapterStatus::WaitingForReview));
        assert!(ChapterStatus::WaitingForReview.can_transition(ChapterStatus::Approved));

        assert!(!ChapterStatus::Pending.can_transition(ChapterStatus::Approved));
        assert!(!ChapterStatus::Approved.can_transition(ChapterStatus::WaitingForReview));
        assert!(!ChapterStatus::Approved.can_transition(ChapterStatus::Approved));
    }

    #[test]
    fn test_chapter_draft_alias() {
        // DRAFT 与 WAITING_FOR_REVIEW 在转移表中完全等价
        assert!(ChapterStatus::Draft.can_transition(ChapterStatus::Approved));
        assert!(ChapterStatus::Draft.can_transition(ChapterStatus::WaitingForReview));
        assert!(ChapterStatus::WaitingForReview.can_transition(ChapterStatus::Draft));
        assert!(ChapterStatus::Draft.is_awaiting_review());

        // 转移结果折叠为规范状态
        assert_eq!(
            ChapterStatus::Pending
                .transition(ChapterStatus::Draft)
                .unwrap(),
            ChapterStatus::WaitingForReview
        );
    }

    #[test]
    fn test_status_round_trip() {
        for s in [
            BookStatus::Planning,
            BookStatus::WritingChapters,
            BookStatus::Completed,
        ] {
            assert_eq!(BookStatus::from_str(s.as_str()), Some(s));
        }
        for s in [
            OutlineStatus::Draft,
            OutlineStatus::WaitingForReview,
            OutlineStatus::Approved,
        ] {
            assert_eq!(OutlineStatus::from_str(s.as_str()), Some(s));
        }
        for s in [
            ChapterStatus::Pending,
            ChapterStatus::Draft,
            ChapterStatus::WaitingForReview,
            ChapterStatus::Approved,
        ] {
            assert_eq!(ChapterStatus::from_str(s.as_str()), Some(s));
        }
    }

    #[test]
    fn test_from_str_accepts_legacy_lowercase() {
        assert_eq!(
            OutlineStatus::from_str("waiting_for_review"),
            Some(OutlineStatus::WaitingForReview)
        );
        assert_eq!(OutlineStatus::from_str("approved"), Some(OutlineStatus::Approved));
        assert_eq!(BookStatus::from_str("unknown"), None);
    }
}
