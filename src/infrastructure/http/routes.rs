//! HTTP Routes
//!
//! API 路由定义
//!
//! API Endpoints:
//! - /api/book/create        POST  创建书籍（同步生成大纲初稿）
//! - /api/book/list          GET   列出所有书籍
//! - /api/book/get           POST  获取书籍详情
//! - /api/book/delete        POST  删除书籍（级联）
//! - /api/book/compile       POST  编译成书
//! - /api/outline/regenerate POST  从头重新起草大纲
//! - /api/outline/revise     POST  带反馈修订大纲
//! - /api/outline/approve    POST  批准大纲并解析章节
//! - /api/outline/reparse    POST  重新解析章节
//! - /api/chapter/generate   POST  生成当前活跃章节
//! - /api/chapter/approve    POST  批准章节（生成摘要）
//! - /api/chapter/regenerate POST  带批注重写章节
//! - /api/chapter/get        POST  获取章节全文

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/book", book_routes())
        .nest("/outline", outline_routes())
        .nest("/chapter", chapter_routes())
}

/// Book 路由
fn book_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(handlers::create_book))
        .route("/list", get(handlers::list_books))
        .route("/get", post(handlers::get_book))
        .route("/delete", post(handlers::delete_book))
        .route("/compile", post(handlers::compile_book))
}

/// Outline 路由
fn outline_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/regenerate", post(handlers::regenerate_outline))
        .route("/revise", post(handlers::revise_outline))
        .route("/approve", post(handlers::approve_outline))
        .route("/reparse", post(handlers::reparse_chapters))
}

/// Chapter 路由
fn chapter_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/generate", post(handlers::generate_chapter))
        .route("/approve", post(handlers::approve_chapter))
        .route("/regenerate", post(handlers::regenerate_chapter))
        .route("/get", post(handlers::get_chapter))
}
