//! Book Commands

use uuid::Uuid;

/// 创建书籍命令（创建后同步生成大纲初稿）
#[derive(Debug, Clone)]
pub struct CreateBook {
    pub title: String,
    /// 初始构思笔记，喂给大纲生成
    pub notes: String,
}

/// 删除书籍命令（级联删除大纲与章节）
#[derive(Debug, Clone)]
pub struct DeleteBook {
    pub book_id: Uuid,
}

/// 编译成书命令（要求全部章节已批准）
#[derive(Debug, Clone)]
pub struct CompileBook {
    pub book_id: Uuid,
}
