//! Repository Ports - 出站端口
//!
//! 定义数据持久化的抽象接口
//! 具体实现在 infrastructure 层（如 SQLite）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{BookStatus, ChapterBrief, ChapterStatus, OutlineStatus};

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// ============================================================================
// Book Repository
// ============================================================================

/// 书籍实体（用于持久化）
#[derive(Debug, Clone)]
pub struct BookRecord {
    pub id: Uuid,
    pub title: String,
    pub status: BookStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookRecord {
    /// 新建 PLANNING 状态的书籍
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            status: BookStatus::Planning,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Book Repository Port
#[async_trait]
pub trait BookRepositoryPort: Send + Sync {
    /// 保存书籍（插入或按 id 覆盖）
    async fn save(&self, book: &BookRecord) -> Result<(), RepositoryError>;

    /// 根据 ID 查找书籍
    async fn find_by_id(&self, id: Uuid) -> Result<Option<BookRecord>, RepositoryError>;

    /// 获取所有书籍，最近创建的在前
    async fn find_all(&self) -> Result<Vec<BookRecord>, RepositoryError>;

    /// 删除书籍，级联删除其大纲与全部章节
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

// ============================================================================
// Outline Repository
// ============================================================================

/// 大纲实体（用于持久化）
///
/// 不变量: 每本书至多一份大纲。重复保存按 book_id 原地覆盖，不产生第二行。
#[derive(Debug, Clone)]
pub struct OutlineRecord {
    pub id: Uuid,
    pub book_id: Uuid,
    pub content: String,
    pub status: OutlineStatus,
    /// 最近一次修订请求的编辑批注，覆盖式保存，不保留历史
    pub editor_notes: Option<String>,
}

/// Outline Repository Port
#[async_trait]
pub trait OutlineRepositoryPort: Send + Sync {
    /// 保存大纲（按 book_id upsert，保证一书一纲）
    async fn save(&self, outline: &OutlineRecord) -> Result<(), RepositoryError>;

    /// 查找某本书的大纲
    async fn find_by_book_id(&self, book_id: Uuid) -> Result<Option<OutlineRecord>, RepositoryError>;
}

// ============================================================================
// Chapter Repository
// ============================================================================

/// 章节实体（用于持久化）
#[derive(Debug, Clone)]
pub struct ChapterRecord {
    pub id: Uuid,
    pub book_id: Uuid,
    /// 书内唯一编号，解析时分配，此后不可变
    pub number: u32,
    pub title: String,
    /// 首次生成前为空
    pub content: Option<String>,
    /// 批准前为空
    pub summary: Option<String>,
    pub status: ChapterStatus,
    /// 生成时清空，重写请求时覆盖
    pub editor_notes: Option<String>,
}

impl ChapterRecord {
    /// 解析阶段创建的 PENDING 占位章节
    pub fn pending(book_id: Uuid, number: u32, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            book_id,
            number,
            title: title.into(),
            content: None,
            summary: None,
            status: ChapterStatus::Pending,
            editor_notes: None,
        }
    }

    /// 上下文组装所需的最小视图
    pub fn brief(&self) -> ChapterBrief<'_> {
        ChapterBrief {
            number: self.number,
            status: self.status,
            summary: self.summary.as_deref(),
        }
    }
}

/// Chapter Repository Port
#[async_trait]
pub trait ChapterRepositoryPort: Send + Sync {
    /// 保存章节（插入或按 id 覆盖；编号与标题在覆盖时不变）
    async fn save(&self, chapter: &ChapterRecord) -> Result<(), RepositoryError>;

    /// 批量插入章节，跳过书内已存在的编号，返回实际插入数
    ///
    /// 解析幂等性的落地点: 重复解析同一大纲不会重复或重置已有章节。
    async fn insert_missing(&self, chapters: &[ChapterRecord]) -> Result<usize, RepositoryError>;

    /// 根据 ID 查找章节
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ChapterRecord>, RepositoryError>;

    /// 获取某本书的全部章节，按编号升序
    async fn find_by_book_id(&self, book_id: Uuid) -> Result<Vec<ChapterRecord>, RepositoryError>;
}
