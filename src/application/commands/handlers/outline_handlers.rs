//! Outline Command Handlers
//!
//! 大纲起草 / 修订 / 批准，以及章节重新解析。
//! 批准是调用大纲解析器的唯一触发点。

use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{ApproveOutline, DraftOutline, ReparseChapters, ReviseOutline};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    BookRepositoryPort, ChapterRecord, ChapterRepositoryPort, LlmEnginePort, OutlineRecord,
    OutlineRepositoryPort,
};
use crate::domain::{parse_outline, BookStatus, OutlineStatus};

/// 大纲响应
#[derive(Debug, Clone)]
pub struct OutlineResponse {
    pub book_id: Uuid,
    pub status: OutlineStatus,
    pub content: String,
    pub editor_notes: Option<String>,
}

impl From<OutlineRecord> for OutlineResponse {
    fn from(record: OutlineRecord) -> Self {
        Self {
            book_id: record.book_id,
            status: record.status,
            content: record.content,
            editor_notes: record.editor_notes,
        }
    }
}

// ============================================================================
// DraftOutline
// ============================================================================

/// DraftOutline Handler - 从书名与笔记从头起草大纲
///
/// 大纲行不存在时创建，存在时原地覆盖。已批准的大纲不可重新起草。
pub struct DraftOutlineHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
    outline_repo: Arc<dyn OutlineRepositoryPort>,
    llm_engine: Arc<dyn LlmEnginePort>,
}

impl DraftOutlineHandler {
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        outline_repo: Arc<dyn OutlineRepositoryPort>,
        llm_engine: Arc<dyn LlmEnginePort>,
    ) -> Self {
        Self {
            book_repo,
            outline_repo,
            llm_engine,
        }
    }

    pub async fn handle(&self, command: DraftOutline) -> Result<OutlineResponse, ApplicationError> {
        let book = self
            .book_repo
            .find_by_id(command.book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", command.book_id))?;

        let existing = self.outline_repo.find_by_book_id(command.book_id).await?;

        // 先校验转移再调用生成，非法时不触碰任何状态
        let current = existing.as_ref().map(|o| o.status).unwrap_or_default();
        let next = current.transition(OutlineStatus::WaitingForReview)?;

        let outcome = self
            .llm_engine
            .generate_outline(&book.title, &command.notes)
            .await;

        if outcome.is_failure() {
            tracing::warn!(
                book_id = %book.id,
                "Outline generation returned failure marker; storing as content"
            );
        }

        let outline = OutlineRecord {
            id: existing.map(|o| o.id).unwrap_or_else(Uuid::new_v4),
            book_id: book.id,
            content: outcome.into_text(),
            status: next,
            editor_notes: None, // 重新起草清空旧批注
        };

        self.outline_repo.save(&outline).await?;

        tracing::info!(
            book_id = %book.id,
            title = %book.title,
            "Outline drafted"
        );

        Ok(OutlineResponse::from(outline))
    }
}

// ============================================================================
// ReviseOutline
// ============================================================================

/// ReviseOutline Handler - 按编辑反馈修订现有大纲
pub struct ReviseOutlineHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
    outline_repo: Arc<dyn OutlineRepositoryPort>,
    llm_engine: Arc<dyn LlmEnginePort>,
}

impl ReviseOutlineHandler {
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        outline_repo: Arc<dyn OutlineRepositoryPort>,
        llm_engine: Arc<dyn LlmEnginePort>,
    ) -> Self {
        Self {
            book_repo,
            outline_repo,
            llm_engine,
        }
    }

    pub async fn handle(&self, command: ReviseOutline) -> Result<OutlineResponse, ApplicationError> {
        if command.feedback.trim().is_empty() {
            return Err(ApplicationError::validation("Feedback notes are required"));
        }

        let book = self
            .book_repo
            .find_by_id(command.book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", command.book_id))?;

        let mut outline = self
            .outline_repo
            .find_by_book_id(command.book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Outline", command.book_id))?;

        let next = outline.status.transition(OutlineStatus::WaitingForReview)?;

        let outcome = self
            .llm_engine
            .regenerate_outline(&outline.content, &command.feedback)
            .await;

        if outcome.is_failure() {
            tracing::warn!(
                book_id = %book.id,
                "Outline revision returned failure marker; storing as content"
            );
        }

        outline.content = outcome.into_text();
        outline.status = next;
        // 只保留最近一次修订请求的批注
        outline.editor_notes = Some(command.feedback);

        self.outline_repo.save(&outline).await?;

        tracing::info!(
            book_id = %book.id,
            title = %book.title,
            "Outline revised with feedback"
        );

        Ok(OutlineResponse::from(outline))
    }
}

// ============================================================================
// ApproveOutline
// ============================================================================

/// 批准响应
#[derive(Debug, Clone)]
pub struct ApproveOutlineResponse {
    pub book_id: Uuid,
    pub book_status: BookStatus,
    /// 大纲中匹配到的标题行数
    pub headings_matched: usize,
    /// 实际新建的章节数（已存在编号被跳过）
    pub chapters_created: usize,
}

/// ApproveOutline Handler
///
/// 大纲 WAITING_FOR_REVIEW -> APPROVED，书籍 PLANNING -> WRITING_CHAPTERS，
/// 然后解析大纲创建章节占位。两个转移都先校验再提交。
///
/// 零标题守卫: 解析不出任何章节的大纲不予批准（ParseWarning，无状态变更），
/// 批准后大纲不可再改，放行会让流程走进死胡同。
pub struct ApproveOutlineHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
    outline_repo: Arc<dyn OutlineRepositoryPort>,
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
}

impl ApproveOutlineHandler {
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        outline_repo: Arc<dyn OutlineRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
    ) -> Self {
        Self {
            book_repo,
            outline_repo,
            chapter_repo,
        }
    }

    pub async fn handle(
        &self,
        command: ApproveOutline,
    ) -> Result<ApproveOutlineResponse, ApplicationError> {
        let mut book = self
            .book_repo
            .find_by_id(command.book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", command.book_id))?;

        let mut outline = self
            .outline_repo
            .find_by_book_id(command.book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Outline", command.book_id))?;

        // 两个转移都通过才提交，任一非法则整个操作无变更
        let outline_next = outline.status.transition(OutlineStatus::Approved)?;
        let book_next = book.status.transition(BookStatus::WritingChapters)?;

        // 零标题守卫（在任何提交之前）
        if parse_outline(&outline.content).is_empty() {
            tracing::warn!(
                book_id = %book.id,
                "Outline has no recognizable chapter headings; approval rejected"
            );
            return Err(ApplicationError::ParseWarning(
                "Outline contains no recognizable chapter headings; revise the outline and approve again"
                    .to_string(),
            ));
        }

        outline.status = outline_next;
        self.outline_repo.save(&outline).await?;

        book.status = book_next;
        book.updated_at = chrono::Utc::now();
        self.book_repo.save(&book).await?;

        // 唯一的解析触发点
        let (headings, created) =
            parse_and_insert(&self.chapter_repo, book.id, &outline.content).await?;

        tracing::info!(
            book_id = %book.id,
            title = %book.title,
            headings = headings,
            created = created,
            "Outline approved, chapters parsed"
        );

        Ok(ApproveOutlineResponse {
            book_id: book.id,
            book_status: book.status,
            headings_matched: headings,
            chapters_created: created,
        })
    }
}

// ============================================================================
// ReparseChapters
// ============================================================================

/// 重新解析响应
#[derive(Debug, Clone)]
pub struct ReparseChaptersResponse {
    pub book_id: Uuid,
    pub headings_matched: usize,
    pub chapters_created: usize,
    pub parse_warning: bool,
}

/// ReparseChapters Handler - 解析重试入口
///
/// 只对已批准的大纲有效，已存在的章节编号一律跳过。
pub struct ReparseChaptersHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
    outline_repo: Arc<dyn OutlineRepositoryPort>,
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
}

impl ReparseChaptersHandler {
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        outline_repo: Arc<dyn OutlineRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
    ) -> Self {
        Self {
            book_repo,
            outline_repo,
            chapter_repo,
        }
    }

    pub async fn handle(
        &self,
        command: ReparseChapters,
    ) -> Result<ReparseChaptersResponse, ApplicationError> {
        let book = self
            .book_repo
            .find_by_id(command.book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", command.book_id))?;

        let outline = self
            .outline_repo
            .find_by_book_id(command.book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Outline", command.book_id))?;

        if outline.status != OutlineStatus::Approved {
            return Err(ApplicationError::invalid_state(format!(
                "Outline must be APPROVED before parsing chapters (status: {})",
                outline.status
            )));
        }

        let (headings, created) =
            parse_and_insert(&self.chapter_repo, book.id, &outline.content).await?;

        tracing::info!(
            book_id = %book.id,
            headings = headings,
            created = created,
            "Chapters re-parsed from outline"
        );

        Ok(ReparseChaptersResponse {
            book_id: book.id,
            headings_matched: headings,
            chapters_created: created,
            parse_warning: headings == 0,
        })
    }
}

/// 解析大纲并插入缺失章节，返回 (匹配标题数, 实际插入数)
///
/// 幂等: 已存在的编号在这里跳过，存储层 UNIQUE 约束兜底。
async fn parse_and_insert(
    chapter_repo: &Arc<dyn ChapterRepositoryPort>,
    book_id: Uuid,
    outline_content: &str,
) -> Result<(usize, usize), ApplicationError> {
    let parsed = parse_outline(outline_content);
    if parsed.is_empty() {
        return Ok((0, 0));
    }

    let existing: HashSet<u32> = chapter_repo
        .find_by_book_id(book_id)
        .await?
        .iter()
        .map(|c| c.number)
        .collect();

    let fresh: Vec<ChapterRecord> = parsed
        .iter()
        .filter(|p| !existing.contains(&p.number))
        .map(|p| ChapterRecord::pending(book_id, p.number, p.title.clone()))
        .collect();

    let created = chapter_repo.insert_missing(&fresh).await?;

    Ok((parsed.len(), created))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChapterStatus;
    use crate::infrastructure::adapters::llm::{FakeLlmClient, FakeLlmClientConfig};
    use crate::infrastructure::persistence::sqlite::{
        create_pool, run_migrations, DatabaseConfig, SqliteBookRepository,
        SqliteChapterRepository, SqliteOutlineRepository,
    };

    struct Fixture {
        book_repo: Arc<dyn BookRepositoryPort>,
        outline_repo: Arc<dyn OutlineRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        llm: Arc<FakeLlmClient>,
    }

    impl Fixture {
        async fn with_llm(llm: FakeLlmClient) -> Self {
            let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
            run_migrations(&pool).await.unwrap();
            Self {
                book_repo: Arc::new(SqliteBookRepository::new(pool.clone())),
                outline_repo: Arc::new(SqliteOutlineRepository::new(pool.clone())),
                chapter_repo: Arc::new(SqliteChapterRepository::new(pool)),
                llm: Arc::new(llm),
            }
        }

        async fn new() -> Self {
            Self::with_llm(FakeLlmClient::with_defaults()).await
        }

        async fn seed_book(&self) -> crate::application::ports::BookRecord {
            let book = crate::application::ports::BookRecord::new("Test Book");
            self.book_repo.save(&book).await.unwrap();
            book
        }

        fn draft(&self) -> DraftOutlineHandler {
            DraftOutlineHandler::new(
                self.book_repo.clone(),
                self.outline_repo.clone(),
                self.llm.clone(),
            )
        }

        fn revise(&self) -> ReviseOutlineHandler {
            ReviseOutlineHandler::new(
                self.book_repo.clone(),
                self.outline_repo.clone(),
                self.llm.clone(),
            )
        }

        fn approve(&self) -> ApproveOutlineHandler {
            ApproveOutlineHandler::new(
                self.book_repo.clone(),
                self.outline_repo.clone(),
                self.chapter_repo.clone(),
            )
        }

        fn reparse(&self) -> ReparseChaptersHandler {
            ReparseChaptersHandler::new(
                self.book_repo.clone(),
                self.outline_repo.clone(),
                self.chapter_repo.clone(),
            )
        }
    }

    #[tokio::test]
    async fn test_draft_creates_outline_waiting_for_review() {
        let fx = Fixture::new().await;
        let book = fx.seed_book().await;

        let response = fx
            .draft()
            .handle(DraftOutline {
                book_id: book.id,
                notes: "A space opera".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.status, OutlineStatus::WaitingForReview);
        assert!(response.content.contains("Chapter 1"));
        assert!(response.editor_notes.is_none());

        // 书籍状态不受起草影响
        let book = fx.book_repo.find_by_id(book.id).await.unwrap().unwrap();
        assert_eq!(book.status, BookStatus::Planning);
    }

    #[tokio::test]
    async fn test_draft_for_missing_book_is_not_found() {
        let fx = Fixture::new().await;
        let err = fx
            .draft()
            .handle(DraftOutline {
                book_id: Uuid::new_v4(),
                notes: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_draft_twice_overwrites_in_place() {
        let fx = Fixture::new().await;
        let book = fx.seed_book().await;

        let first = fx
            .draft()
            .handle(DraftOutline {
                book_id: book.id,
                notes: String::new(),
            })
            .await
            .unwrap();
        fx.draft()
            .handle(DraftOutline {
                book_id: book.id,
                notes: "fresh take".to_string(),
            })
            .await
            .unwrap();

        let outline = fx
            .outline_repo
            .find_by_book_id(book.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outline.status, OutlineStatus::WaitingForReview);
        // 原地覆盖，book_id 维度仍只有一行
        assert_eq!(outline.book_id, first.book_id);
    }

    #[tokio::test]
    async fn test_revise_stores_feedback_notes() {
        let fx = Fixture::new().await;
        let book = fx.seed_book().await;
        fx.draft()
            .handle(DraftOutline {
                book_id: book.id,
                notes: String::new(),
            })
            .await
            .unwrap();

        let response = fx
            .revise()
            .handle(ReviseOutline {
                book_id: book.id,
                feedback: "Make it strictly 5 chapters".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.status, OutlineStatus::WaitingForReview);
        assert_eq!(
            response.editor_notes.as_deref(),
            Some("Make it strictly 5 chapters")
        );
        assert!(response.content.contains("Revised per"));
    }

    #[tokio::test]
    async fn test_revise_overwrites_previous_notes() {
        let fx = Fixture::new().await;
        let book = fx.seed_book().await;
        fx.draft()
            .handle(DraftOutline {
                book_id: book.id,
                notes: String::new(),
            })
            .await
            .unwrap();

        for feedback in ["first pass", "second pass"] {
            fx.revise()
                .handle(ReviseOutline {
                    book_id: book.id,
                    feedback: feedback.to_string(),
                })
                .await
                .unwrap();
        }

        let outline = fx
            .outline_repo
            .find_by_book_id(book.id)
            .await
            .unwrap()
            .unwrap();
        // 批注覆盖式保存，不追加历史
        assert_eq!(outline.editor_notes.as_deref(), Some("second pass"));
    }

    #[tokio::test]
    async fn test_revise_without_outline_is_not_found() {
        let fx = Fixture::new().await;
        let book = fx.seed_book().await;
        let err = fx
            .revise()
            .handle(ReviseOutline {
                book_id: book.id,
                feedback: "anything".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_approve_transitions_book_and_creates_chapters() {
        let fx = Fixture::new().await;
        let book = fx.seed_book().await;
        fx.draft()
            .handle(DraftOutline {
                book_id: book.id,
                notes: String::new(),
            })
            .await
            .unwrap();

        let response = fx
            .approve()
            .handle(ApproveOutline { book_id: book.id })
            .await
            .unwrap();

        assert_eq!(response.book_status, BookStatus::WritingChapters);
        assert_eq!(response.headings_matched, 3);
        assert_eq!(response.chapters_created, 3);

        let outline = fx
            .outline_repo
            .find_by_book_id(book.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outline.status, OutlineStatus::Approved);

        let chapters = fx.chapter_repo.find_by_book_id(book.id).await.unwrap();
        let numbers: Vec<u32> = chapters.iter().map(|c| c.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(chapters
            .iter()
            .all(|c| c.status == ChapterStatus::Pending && c.content.is_none()));
    }

    #[tokio::test]
    async fn test_approve_twice_fails_and_changes_nothing() {
        let fx = Fixture::new().await;
        let book = fx.seed_book().await;
        fx.draft()
            .handle(DraftOutline {
                book_id: book.id,
                notes: String::new(),
            })
            .await
            .unwrap();
        fx.approve()
            .handle(ApproveOutline { book_id: book.id })
            .await
            .unwrap();

        // 书已进入 WRITING_CHAPTERS，再批准是非法转移
        let err = fx
            .approve()
            .handle(ApproveOutline { book_id: book.id })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidTransition(_)));

        let book = fx.book_repo.find_by_id(book.id).await.unwrap().unwrap();
        assert_eq!(book.status, BookStatus::WritingChapters);
        assert_eq!(fx.chapter_repo.find_by_book_id(book.id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_draft_on_approved_outline_is_rejected() {
        let fx = Fixture::new().await;
        let book = fx.seed_book().await;
        fx.draft()
            .handle(DraftOutline {
                book_id: book.id,
                notes: String::new(),
            })
            .await
            .unwrap();
        fx.approve()
            .handle(ApproveOutline { book_id: book.id })
            .await
            .unwrap();

        // 批准后大纲不可变
        let err = fx
            .draft()
            .handle(DraftOutline {
                book_id: book.id,
                notes: "start over".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidTransition(_)));

        let err = fx
            .revise()
            .handle(ReviseOutline {
                book_id: book.id,
                feedback: "tweak it".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_approve_rejects_outline_with_no_headings() {
        let fx = Fixture::with_llm(FakeLlmClient::new(FakeLlmClientConfig {
            outline_chapters: 0,
            fail_with: None,
        }))
        .await;
        let book = fx.seed_book().await;
        fx.draft()
            .handle(DraftOutline {
                book_id: book.id,
                notes: String::new(),
            })
            .await
            .unwrap();

        let err = fx
            .approve()
            .handle(ApproveOutline { book_id: book.id })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::ParseWarning(_)));

        // 无任何状态变更，可修订后重试
        let book = fx.book_repo.find_by_id(book.id).await.unwrap().unwrap();
        assert_eq!(book.status, BookStatus::Planning);
        let outline = fx
            .outline_repo
            .find_by_book_id(book.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outline.status, OutlineStatus::WaitingForReview);
        assert!(fx.chapter_repo.find_by_book_id(book.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reparse_is_idempotent_on_unchanged_outline() {
        let fx = Fixture::new().await;
        let book = fx.seed_book().await;
        fx.draft()
            .handle(DraftOutline {
                book_id: book.id,
                notes: String::new(),
            })
            .await
            .unwrap();
        fx.approve()
            .handle(ApproveOutline { book_id: book.id })
            .await
            .unwrap();

        let response = fx
            .reparse()
            .handle(ReparseChapters { book_id: book.id })
            .await
            .unwrap();

        assert_eq!(response.headings_matched, 3);
        // 编号已存在，一个都不新建
        assert_eq!(response.chapters_created, 0);
        assert_eq!(fx.chapter_repo.find_by_book_id(book.id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_reparse_requires_approved_outline() {
        let fx = Fixture::new().await;
        let book = fx.seed_book().await;
        fx.draft()
            .handle(DraftOutline {
                book_id: book.id,
                notes: String::new(),
            })
            .await
            .unwrap();

        let err = fx
            .reparse()
            .handle(ReparseChapters { book_id: book.id })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidState(_)));
    }
}
