//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod book_handlers;
mod chapter_handlers;
mod outline_handlers;

pub use book_handlers::*;
pub use chapter_handlers::*;
pub use outline_handlers::*;
