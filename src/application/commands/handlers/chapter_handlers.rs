//! Chapter Command Handlers
//!
//! 逐章写作流程: 生成活跃章节、批准并生成摘要、带批注重写。
//! 活跃章节（编号最小的未批准章节）是派生值，每次操作都从当前
//! 章节状态现算，从不缓存。

use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{ApproveChapter, GenerateNextChapter, RegenerateChapter};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    BookRepositoryPort, ChapterPrompt, ChapterRecord, ChapterRepositoryPort, LlmEnginePort,
    OutlineRepositoryPort,
};
use crate::domain::{assemble_context, BookStatus, ChapterBrief, ChapterStatus, TransitionError};

/// 章节响应
#[derive(Debug, Clone)]
pub struct ChapterResponse {
    pub id: Uuid,
    pub book_id: Uuid,
    pub number: u32,
    pub title: String,
    pub status: ChapterStatus,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub editor_notes: Option<String>,
}

impl From<ChapterRecord> for ChapterResponse {
    fn from(record: ChapterRecord) -> Self {
        Self {
            id: record.id,
            book_id: record.book_id,
            number: record.number,
            title: record.title,
            status: record.status,
            content: record.content,
            summary: record.summary,
            editor_notes: record.editor_notes,
        }
    }
}

// ============================================================================
// GenerateNextChapter
// ============================================================================

/// 生成结果: 有活跃章节则生成，否则全部章节已批准、可编译成书
#[derive(Debug, Clone)]
pub enum GenerateChapterOutcome {
    Generated(ChapterResponse),
    AllChaptersApproved,
}

/// GenerateNextChapter Handler
pub struct GenerateNextChapterHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
    outline_repo: Arc<dyn OutlineRepositoryPort>,
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    llm_engine: Arc<dyn LlmEnginePort>,
}

impl GenerateNextChapterHandler {
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        outline_repo: Arc<dyn OutlineRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        llm_engine: Arc<dyn LlmEnginePort>,
    ) -> Self {
        Self {
            book_repo,
            outline_repo,
            chapter_repo,
            llm_engine,
        }
    }

    pub async fn handle(
        &self,
        command: GenerateNextChapter,
    ) -> Result<GenerateChapterOutcome, ApplicationError> {
        let book = self
            .book_repo
            .find_by_id(command.book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", command.book_id))?;

        if book.status != BookStatus::WritingChapters {
            return Err(ApplicationError::invalid_state(format!(
                "Book is not in WRITING_CHAPTERS (status: {})",
                book.status
            )));
        }

        let outline = self
            .outline_repo
            .find_by_book_id(command.book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Outline", command.book_id))?;

        let chapters = self.chapter_repo.find_by_book_id(command.book_id).await?;
        if chapters.is_empty() {
            return Err(ApplicationError::invalid_state(
                "No chapters have been parsed from the outline".to_string(),
            ));
        }

        // 派生活跃章节: 编号最小的未批准章节
        let Some(active) = chapters.iter().find(|c| !c.status.is_approved()) else {
            return Ok(GenerateChapterOutcome::AllChaptersApproved);
        };

        let next = active.status.transition(ChapterStatus::WaitingForReview)?;

        // 上下文只来自目标之前已批准章节的摘要
        let briefs: Vec<ChapterBrief<'_>> = chapters.iter().map(|c| c.brief()).collect();
        let prior_context = assemble_context(&briefs, active.number);

        let outcome = self
            .llm_engine
            .generate_chapter(ChapterPrompt {
                book_title: book.title.clone(),
                chapter_title: active.title.clone(),
                outline: outline.content.clone(),
                prior_context,
                notes: command.notes.clone(),
            })
            .await;

        if outcome.is_failure() {
            // 失败作为内容落库，审阅人可见后显式要求重写
            tracing::warn!(
                book_id = %book.id,
                chapter = active.number,
                "Chapter generation returned failure marker; storing as content"
            );
        }

        let mut chapter = active.clone();
        chapter.content = Some(outcome.into_text());
        chapter.status = next;
        chapter.editor_notes = None;

        // 内容与状态同一行提交，读取方不会看到半新半旧
        self.chapter_repo.save(&chapter).await?;

        tracing::info!(
            book_id = %book.id,
            chapter = chapter.number,
            title = %chapter.title,
            "Chapter generated"
        );

        Ok(GenerateChapterOutcome::Generated(ChapterResponse::from(
            chapter,
        )))
    }
}

// ============================================================================
// ApproveChapter
// ============================================================================

/// 批准响应
#[derive(Debug, Clone)]
pub struct ApproveChapterResponse {
    pub chapter: ChapterResponse,
    /// 本书全部章节是否已批准（可进入编译）
    pub book_completion_eligible: bool,
}

/// ApproveChapter Handler
///
/// WAITING_FOR_REVIEW/DRAFT -> APPROVED；批准时生成并保存摘要。
pub struct ApproveChapterHandler {
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    llm_engine: Arc<dyn LlmEnginePort>,
}

impl ApproveChapterHandler {
    pub fn new(
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        llm_engine: Arc<dyn LlmEnginePort>,
    ) -> Self {
        Self {
            chapter_repo,
            llm_engine,
        }
    }

    pub async fn handle(
        &self,
        command: ApproveChapter,
    ) -> Result<ApproveChapterResponse, ApplicationError> {
        let mut chapter = self
            .chapter_repo
            .find_by_id(command.chapter_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Chapter", command.chapter_id))?;

        // PENDING 或已 APPROVED 的章节在这里被拒绝，字段不变
        let next = chapter.status.transition(ChapterStatus::Approved)?;

        let content = chapter.content.as_deref().ok_or_else(|| {
            ApplicationError::validation("Chapter has no content to summarize")
        })?;

        let outcome = self.llm_engine.summarize(content).await;
        if outcome.is_failure() {
            tracing::warn!(
                chapter_id = %chapter.id,
                "Summary generation returned failure marker; storing as summary"
            );
        }

        // 摘要只在进入 APPROVED 的转移上产生
        chapter.summary = Some(outcome.into_text());
        chapter.status = next;

        self.chapter_repo.save(&chapter).await?;

        let all = self.chapter_repo.find_by_book_id(chapter.book_id).await?;
        let book_completion_eligible = all.iter().all(|c| c.status.is_approved());

        tracing::info!(
            book_id = %chapter.book_id,
            chapter = chapter.number,
            completion_eligible = book_completion_eligible,
            "Chapter approved"
        );

        Ok(ApproveChapterResponse {
            chapter: ChapterResponse::from(chapter),
            book_completion_eligible,
        })
    }
}

// ============================================================================
// RegenerateChapter
// ============================================================================

/// RegenerateChapter Handler
///
/// 仅定义于待审阅状态（WAITING_FOR_REVIEW/DRAFT），重写后状态不变，
/// 驱动重写的批注覆盖式保存。
pub struct RegenerateChapterHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
    outline_repo: Arc<dyn OutlineRepositoryPort>,
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    llm_engine: Arc<dyn LlmEnginePort>,
}

impl RegenerateChapterHandler {
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        outline_repo: Arc<dyn OutlineRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        llm_engine: Arc<dyn LlmEnginePort>,
    ) -> Self {
        Self {
            book_repo,
            outline_repo,
            chapter_repo,
            llm_engine,
        }
    }

    pub async fn handle(
        &self,
        command: RegenerateChapter,
    ) -> Result<ChapterResponse, ApplicationError> {
        let mut chapter = self
            .chapter_repo
            .find_by_id(command.chapter_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Chapter", command.chapter_id))?;

        // 重写只定义在 WAITING_FOR_REVIEW ⇄ WAITING_FOR_REVIEW 上，
        // PENDING 章节走 GenerateNextChapter
        if !chapter.status.is_awaiting_review() {
            return Err(TransitionError {
                entity: "chapter",
                from: chapter.status.as_str(),
                to: ChapterStatus::WaitingForReview.as_str(),
            }
            .into());
        }
        let next = chapter.status.transition(ChapterStatus::WaitingForReview)?;

        let book = self
            .book_repo
            .find_by_id(chapter.book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", chapter.book_id))?;

        let outline = self
            .outline_repo
            .find_by_book_id(chapter.book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Outline", chapter.book_id))?;

        // 上界是本章编号，与首次生成相同的组装规则
        let chapters = self.chapter_repo.find_by_book_id(chapter.book_id).await?;
        let briefs: Vec<ChapterBrief<'_>> = chapters.iter().map(|c| c.brief()).collect();
        let prior_context = assemble_context(&briefs, chapter.number);

        let outcome = self
            .llm_engine
            .generate_chapter(ChapterPrompt {
                book_title: book.title.clone(),
                chapter_title: chapter.title.clone(),
                outline: outline.content.clone(),
                prior_context,
                notes: command.notes.clone(),
            })
            .await;

        if outcome.is_failure() {
            tracing::warn!(
                book_id = %book.id,
                chapter = chapter.number,
                "Chapter regeneration returned failure marker; storing as content"
            );
        }

        chapter.content = Some(outcome.into_text());
        chapter.status = next;
        chapter.editor_notes = Some(command.notes);

        self.chapter_repo.save(&chapter).await?;

        tracing::info!(
            book_id = %book.id,
            chapter = chapter.number,
            "Chapter regenerated with notes"
        );

        Ok(ChapterResponse::from(chapter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::handlers::{ApproveOutlineHandler, DraftOutlineHandler};
    use crate::application::commands::{ApproveOutline, DraftOutline};
    use crate::application::ports::{BookRecord, LlmEnginePort};
    use crate::infrastructure::adapters::llm::FakeLlmClient;
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
        async fn new() -> Self {
            let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
            run_migrations(&pool).await.unwrap();
            Self {
                book_repo: Arc::new(SqliteBookRepository::new(pool.clone())),
                outline_repo: Arc::new(SqliteOutlineRepository::new(pool.clone())),
                chapter_repo: Arc::new(SqliteChapterRepository::new(pool)),
                llm: Arc::new(FakeLlmClient::with_defaults()),
            }
        }

        /// 走完规划阶段: 建书、起草大纲、批准并解析出 3 个 PENDING 章节
        async fn book_in_writing(&self) -> Uuid {
            let book = BookRecord::new("Test Book");
            self.book_repo.save(&book).await.unwrap();

            DraftOutlineHandler::new(
                self.book_repo.clone(),
                self.outline_repo.clone(),
                self.llm.clone(),
            )
            .handle(DraftOutline {
                book_id: book.id,
                notes: String::new(),
            })
            .await
            .unwrap();

            ApproveOutlineHandler::new(
                self.book_repo.clone(),
                self.outline_repo.clone(),
                self.chapter_repo.clone(),
            )
            .handle(ApproveOutline { book_id: book.id })
            .await
            .unwrap();

            book.id
        }

        fn generate(&self) -> GenerateNextChapterHandler {
            self.generate_with(self.llm.clone())
        }

        fn generate_with(&self, llm: Arc<dyn LlmEnginePort>) -> GenerateNextChapterHandler {
            GenerateNextChapterHandler::new(
                self.book_repo.clone(),
                self.outline_repo.clone(),
                self.chapter_repo.clone(),
                llm,
            )
        }

        fn approve(&self) -> ApproveChapterHandler {
            ApproveChapterHandler::new(self.chapter_repo.clone(), self.llm.clone())
        }

        fn regenerate(&self) -> RegenerateChapterHandler {
            RegenerateChapterHandler::new(
                self.book_repo.clone(),
                self.outline_repo.clone(),
                self.chapter_repo.clone(),
                self.llm.clone(),
            )
        }

        async fn generated_chapter(&self, book_id: Uuid, notes: &str) -> ChapterResponse {
            match self
                .generate()
                .handle(GenerateNextChapter {
                    book_id,
                    notes: notes.to_string(),
                })
                .await
                .unwrap()
            {
                GenerateChapterOutcome::Generated(chapter) => chapter,
                GenerateChapterOutcome::AllChaptersApproved => {
                    panic!("expected an active chapter")
                }
            }
        }
    }

    #[tokio::test]
    async fn test_generate_first_chapter_with_empty_context() {
        let fx = Fixture::new().await;
        let book_id = fx.book_in_writing().await;

        let chapter = fx.generated_chapter(book_id, "keep it short").await;

        assert_eq!(chapter.number, 1);
        assert_eq!(chapter.status, ChapterStatus::WaitingForReview);
        assert!(chapter.content.is_some());
        assert!(chapter.editor_notes.is_none());

        // 第一章没有前文摘要，上下文为空串
        let prompt = fx.llm.last_chapter_prompt().unwrap();
        assert_eq!(prompt.prior_context, "");
        assert_eq!(prompt.book_title, "Test Book");
        assert_eq!(prompt.chapter_title, "Part 1");
        assert_eq!(prompt.notes, "keep it short");
        assert!(prompt.outline.contains("Chapter 1"));
    }

    #[tokio::test]
    async fn test_generate_builds_context_from_approved_summaries() {
        let fx = Fixture::new().await;
        let book_id = fx.book_in_writing().await;

        let first = fx.generated_chapter(book_id, "").await;
        fx.approve()
            .handle(ApproveChapter {
                chapter_id: first.id,
            })
            .await
            .unwrap();

        let approved = fx
            .chapter_repo
            .find_by_id(first.id)
            .await
            .unwrap()
            .unwrap();
        let summary = approved.summary.unwrap();

        let second = fx.generated_chapter(book_id, "").await;
        assert_eq!(second.number, 2);

        let prompt = fx.llm.last_chapter_prompt().unwrap();
        assert_eq!(prompt.prior_context, format!("Chapter 1 Summary: {}", summary));
    }

    #[tokio::test]
    async fn test_generate_requires_writing_status() {
        let fx = Fixture::new().await;
        // 书籍停留在 PLANNING
        let book = BookRecord::new("Planning Book");
        fx.book_repo.save(&book).await.unwrap();

        let err = fx
            .generate()
            .handle(GenerateNextChapter {
                book_id: book.id,
                notes: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_generate_reports_completion_when_all_approved() {
        let fx = Fixture::new().await;
        let book_id = fx.book_in_writing().await;

        for _ in 0..3 {
            let chapter = fx.generated_chapter(book_id, "").await;
            fx.approve()
                .handle(ApproveChapter {
                    chapter_id: chapter.id,
                })
                .await
                .unwrap();
        }

        let outcome = fx
            .generate()
            .handle(GenerateNextChapter {
                book_id,
                notes: String::new(),
            })
            .await
            .unwrap();
        assert!(matches!(outcome, GenerateChapterOutcome::AllChaptersApproved));
    }

    #[tokio::test]
    async fn test_generation_failure_is_stored_as_content() {
        let fx = Fixture::new().await;
        let book_id = fx.book_in_writing().await;

        let failing: Arc<dyn LlmEnginePort> = Arc::new(FakeLlmClient::failing("rate limited"));
        let outcome = fx
            .generate_with(failing)
            .handle(GenerateNextChapter {
                book_id,
                notes: String::new(),
            })
            .await
            .unwrap();

        // 失败标记作为内容落库，状态照常进入待审阅
        let GenerateChapterOutcome::Generated(chapter) = outcome else {
            panic!("expected a generated chapter");
        };
        assert_eq!(chapter.status, ChapterStatus::WaitingForReview);
        assert_eq!(chapter.content.as_deref(), Some("Error: rate limited"));
    }

    #[tokio::test]
    async fn test_approve_pending_chapter_fails_unchanged() {
        let fx = Fixture::new().await;
        let book_id = fx.book_in_writing().await;

        let chapters = fx.chapter_repo.find_by_book_id(book_id).await.unwrap();
        let pending = &chapters[0];

        let err = fx
            .approve()
            .handle(ApproveChapter {
                chapter_id: pending.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidTransition(_)));

        // 字段全部保持原样
        let unchanged = fx
            .chapter_repo
            .find_by_id(pending.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unchanged.status, ChapterStatus::Pending);
        assert!(unchanged.content.is_none());
        assert!(unchanged.summary.is_none());
    }

    #[tokio::test]
    async fn test_approve_sets_summary_and_reports_eligibility() {
        let fx = Fixture::new().await;
        let book_id = fx.book_in_writing().await;

        let chapter = fx.generated_chapter(book_id, "").await;
        assert!(chapter.summary.is_none());

        let response = fx
            .approve()
            .handle(ApproveChapter {
                chapter_id: chapter.id,
            })
            .await
            .unwrap();

        assert_eq!(response.chapter.status, ChapterStatus::Approved);
        // 摘要只在进入 APPROVED 时产生
        assert!(response.chapter.summary.is_some());
        // 还剩两章未批准
        assert!(!response.book_completion_eligible);
    }

    #[tokio::test]
    async fn test_approve_approved_chapter_fails() {
        let fx = Fixture::new().await;
        let book_id = fx.book_in_writing().await;

        let chapter = fx.generated_chapter(book_id, "").await;
        fx.approve()
            .handle(ApproveChapter {
                chapter_id: chapter.id,
            })
            .await
            .unwrap();

        let err = fx
            .approve()
            .handle(ApproveChapter {
                chapter_id: chapter.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_regenerate_keeps_status_and_stores_notes() {
        let fx = Fixture::new().await;
        let book_id = fx.book_in_writing().await;

        let chapter = fx.generated_chapter(book_id, "").await;

        let response = fx
            .regenerate()
            .handle(RegenerateChapter {
                chapter_id: chapter.id,
                notes: "More drama in the middle".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.status, ChapterStatus::WaitingForReview);
        assert_eq!(
            response.editor_notes.as_deref(),
            Some("More drama in the middle")
        );

        let prompt = fx.llm.last_chapter_prompt().unwrap();
        assert_eq!(prompt.notes, "More drama in the middle");
        // 第一章重写时上下文仍为空
        assert_eq!(prompt.prior_context, "");
    }

    #[tokio::test]
    async fn test_regenerate_pending_chapter_is_rejected() {
        let fx = Fixture::new().await;
        let book_id = fx.book_in_writing().await;

        let chapters = fx.chapter_repo.find_by_book_id(book_id).await.unwrap();
        let err = fx
            .regenerate()
            .handle(RegenerateChapter {
                chapter_id: chapters[0].id,
                notes: "anything".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_regenerate_missing_chapter_is_not_found() {
        let fx = Fixture::new().await;
        let err = fx
            .regenerate()
            .handle(RegenerateChapter {
                chapter_id: Uuid::new_v4(),
                notes: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound { .. }));
    }
}
