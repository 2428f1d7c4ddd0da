//! Outline HTTP Handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{ApproveOutline, DraftOutline, ReparseChapters, ReviseOutline};
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegenerateOutlineRequest {
    pub book_id: Uuid,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviseOutlineRequest {
    pub book_id: Uuid,
    pub feedback: String,
}

#[derive(Debug, Serialize)]
pub struct OutlineResponse {
    pub book_id: Uuid,
    pub status: String,
    pub content: String,
    pub editor_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApproveOutlineRequest {
    pub book_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ApproveOutlineResponse {
    pub book_id: Uuid,
    pub book_status: String,
    pub headings_matched: usize,
    pub chapters_created: usize,
}

#[derive(Debug, Deserialize)]
pub struct ReparseChaptersRequest {
    pub book_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ReparseChaptersResponse {
    pub book_id: Uuid,
    pub headings_matched: usize,
    pub chapters_created: usize,
    pub parse_warning: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// 从头重新起草大纲
pub async fn regenerate_outline(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegenerateOutlineRequest>,
) -> Result<Json<ApiResponse<OutlineResponse>>, ApiError> {
    let result = state
        .draft_outline_handler
        .handle(DraftOutline {
            book_id: req.book_id,
            notes: req.notes,
        })
        .await?;

    Ok(Json(ApiResponse::success(OutlineResponse {
        book_id: result.book_id,
        status: result.status.as_str().to_string(),
        content: result.content,
        editor_notes: result.editor_notes,
    })))
}

/// 带编辑反馈修订大纲
pub async fn revise_outline(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReviseOutlineRequest>,
) -> Result<Json<ApiResponse<OutlineResponse>>, ApiError> {
    let result = state
        .revise_outline_handler
        .handle(ReviseOutline {
            book_id: req.book_id,
            feedback: req.feedback,
        })
        .await?;

    Ok(Json(ApiResponse::success(OutlineResponse {
        book_id: result.book_id,
        status: result.status.as_str().to_string(),
        content: result.content,
        editor_notes: result.editor_notes,
    })))
}

/// 批准大纲并解析章节
pub async fn approve_outline(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ApproveOutlineRequest>,
) -> Result<Json<ApiResponse<ApproveOutlineResponse>>, ApiError> {
    let result = state
        .approve_outline_handler
        .handle(ApproveOutline {
            book_id: req.book_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(ApproveOutlineResponse {
        book_id: result.book_id,
        book_status: result.book_status.as_str().to_string(),
        headings_matched: result.headings_matched,
        chapters_created: result.chapters_created,
    })))
}

/// 重新解析章节（解析零章节后的重试入口）
pub async fn reparse_chapters(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReparseChaptersRequest>,
) -> Result<Json<ApiResponse<ReparseChaptersResponse>>, ApiError> {
    let result = state
        .reparse_chapters_handler
        .handle(ReparseChapters {
            book_id: req.book_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(ReparseChaptersResponse {
        book_id: result.book_id,
        headings_matched: result.headings_matched,
        chapters_created: result.chapters_created,
        parse_warning: result.parse_warning,
    })))
}
