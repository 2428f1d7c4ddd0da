//! Book Queries

use uuid::Uuid;

/// 获取书籍详情查询（含大纲与章节概览）
#[derive(Debug, Clone)]
pub struct GetBook {
    pub book_id: Uuid,
}

/// 列出所有书籍查询，最近创建的在前
#[derive(Debug, Clone)]
pub struct ListBooks;

/// 获取章节全文查询
#[derive(Debug, Clone)]
pub struct GetChapter {
    pub chapter_id: Uuid,
}
