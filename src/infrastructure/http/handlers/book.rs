//! Book HTTP Handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{CompileBook, CreateBook, DeleteBook, GetBook, ListBooks};
use crate::infrastructure::http::dto::{ApiResponse, Empty};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Serialize)]
pub struct CreateBookResponse {
    pub id: Uuid,
    pub title: String,
    pub status: String,
    pub outline_status: String,
}

#[derive(Debug, Serialize)]
pub struct BookListItem {
    pub id: Uuid,
    pub title: String,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct GetBookRequest {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct OutlineBody {
    pub status: String,
    pub content: String,
    pub editor_notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChapterListItem {
    pub id: Uuid,
    pub number: u32,
    pub title: String,
    pub status: String,
    pub has_content: bool,
    pub has_summary: bool,
}

#[derive(Debug, Serialize)]
pub struct BookDetailResponse {
    pub id: Uuid,
    pub title: String,
    pub status: String,
    pub created_at: String,
    pub outline: Option<OutlineBody>,
    pub chapters: Vec<ChapterListItem>,
    /// 当前活跃章节编号（编号最小的未批准章节）
    pub active_chapter: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteBookRequest {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CompileBookRequest {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CompileBookResponse {
    pub id: Uuid,
    pub status: String,
    pub chapters: usize,
    pub output_path: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// 创建书籍（同步生成大纲初稿）
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookRequest>,
) -> Result<Json<ApiResponse<CreateBookResponse>>, ApiError> {
    let command = CreateBook {
        title: req.title,
        notes: req.notes,
    };

    let result = state.create_book_handler.handle(command).await?;

    Ok(Json(ApiResponse::success(CreateBookResponse {
        id: result.id,
        title: result.title,
        status: result.status.as_str().to_string(),
        outline_status: result.outline_status.as_str().to_string(),
    })))
}

/// 获取书籍列表（最近创建的在前）
pub async fn list_books(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<BookListItem>>>, ApiError> {
    let result = state.list_books_handler.handle(ListBooks).await?;

    let items: Vec<BookListItem> = result
        .into_iter()
        .map(|b| BookListItem {
            id: b.id,
            title: b.title,
            status: b.status,
            created_at: b.created_at,
        })
        .collect();

    Ok(Json(ApiResponse::success(items)))
}

/// 获取书籍详情（含大纲、章节概览与活跃章节）
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GetBookRequest>,
) -> Result<Json<ApiResponse<BookDetailResponse>>, ApiError> {
    let result = state.get_book_handler.handle(GetBook { book_id: req.id }).await?;

    Ok(Json(ApiResponse::success(BookDetailResponse {
        id: result.id,
        title: result.title,
        status: result.status,
        created_at: result.created_at,
        outline: result.outline.map(|o| OutlineBody {
            status: o.status,
            content: o.content,
            editor_notes: o.editor_notes,
        }),
        chapters: result
            .chapters
            .into_iter()
            .map(|c| ChapterListItem {
                id: c.id,
                number: c.number,
                title: c.title,
                status: c.status,
                has_content: c.has_content,
                has_summary: c.has_summary,
            })
            .collect(),
        active_chapter: result.active_chapter,
    })))
}

/// 删除书籍（级联删除大纲与章节）
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DeleteBookRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state
        .delete_book_handler
        .handle(DeleteBook { book_id: req.id })
        .await?;

    Ok(Json(ApiResponse::ok()))
}

/// 编译成书（要求全部章节已批准）
pub async fn compile_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CompileBookRequest>,
) -> Result<Json<ApiResponse<CompileBookResponse>>, ApiError> {
    let result = state
        .compile_book_handler
        .handle(CompileBook { book_id: req.id })
        .await?;

    Ok(Json(ApiResponse::success(CompileBookResponse {
        id: result.book_id,
        status: result.status.as_str().to_string(),
        chapters: result.chapters,
        output_path: result.output_path.to_string_lossy().to_string(),
    })))
}
