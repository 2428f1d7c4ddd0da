//! Chapter HTTP Handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{
    ApproveChapter, ChapterResponse, GenerateChapterOutcome, GenerateNextChapter, GetChapter,
    RegenerateChapter,
};
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GenerateChapterRequest {
    pub book_id: Uuid,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Serialize)]
pub struct ChapterBody {
    pub id: Uuid,
    pub book_id: Uuid,
    pub number: u32,
    pub title: String,
    pub status: String,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub editor_notes: Option<String>,
}

impl From<ChapterResponse> for ChapterBody {
    fn from(r: ChapterResponse) -> Self {
        Self {
            id: r.id,
            book_id: r.book_id,
            number: r.number,
            title: r.title,
            status: r.status.as_str().to_string(),
            content: r.content,
            summary: r.summary,
            editor_notes: r.editor_notes,
        }
    }
}

/// 生成响应: 没有活跃章节时 chapter 为空，all_chapters_approved 为 true
#[derive(Debug, Serialize)]
pub struct GenerateChapterResponse {
    pub all_chapters_approved: bool,
    pub chapter: Option<ChapterBody>,
}

#[derive(Debug, Deserialize)]
pub struct ApproveChapterRequest {
    pub chapter_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ApproveChapterResponse {
    pub chapter: ChapterBody,
    /// 全部章节已批准，可编译成书
    pub book_completion_eligible: bool,
}

#[derive(Debug, Deserialize)]
pub struct RegenerateChapterRequest {
    pub chapter_id: Uuid,
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct GetChapterRequest {
    pub chapter_id: Uuid,
}

// ============================================================================
// Handlers
// ============================================================================

/// 生成当前活跃章节
pub async fn generate_chapter(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateChapterRequest>,
) -> Result<Json<ApiResponse<GenerateChapterResponse>>, ApiError> {
    let outcome = state
        .generate_chapter_handler
        .handle(GenerateNextChapter {
            book_id: req.book_id,
            notes: req.notes,
        })
        .await?;

    let response = match outcome {
        GenerateChapterOutcome::Generated(chapter) => GenerateChapterResponse {
            all_chapters_approved: false,
            chapter: Some(ChapterBody::from(chapter)),
        },
        GenerateChapterOutcome::AllChaptersApproved => GenerateChapterResponse {
            all_chapters_approved: true,
            chapter: None,
        },
    };

    Ok(Json(ApiResponse::success(response)))
}

/// 批准章节（生成摘要）
pub async fn approve_chapter(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ApproveChapterRequest>,
) -> Result<Json<ApiResponse<ApproveChapterResponse>>, ApiError> {
    let result = state
        .approve_chapter_handler
        .handle(ApproveChapter {
            chapter_id: req.chapter_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(ApproveChapterResponse {
        chapter: ChapterBody::from(result.chapter),
        book_completion_eligible: result.book_completion_eligible,
    })))
}

/// 带批注重写章节
pub async fn regenerate_chapter(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegenerateChapterRequest>,
) -> Result<Json<ApiResponse<ChapterBody>>, ApiError> {
    let result = state
        .regenerate_chapter_handler
        .handle(RegenerateChapter {
            chapter_id: req.chapter_id,
            notes: req.notes,
        })
        .await?;

    Ok(Json(ApiResponse::success(ChapterBody::from(result))))
}

/// 获取章节全文
pub async fn get_chapter(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GetChapterRequest>,
) -> Result<Json<ApiResponse<ChapterBody>>, ApiError> {
    let result = state
        .get_chapter_handler
        .handle(GetChapter {
            chapter_id: req.chapter_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(ChapterBody {
        id: result.id,
        book_id: result.book_id,
        number: result.number,
        title: result.title,
        status: result.status,
        content: result.content,
        summary: result.summary,
        editor_notes: result.editor_notes,
    })))
}
