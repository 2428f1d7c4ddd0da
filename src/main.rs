//! Bookforge - 人机协同的书籍生成工作流
//!
//! - Domain: workflow / outline_parser / context
//! - Application: commands, queries, ports
//! - Infrastructure: http, persistence, adapters

use std::sync::Arc;

use bookforge::config::{load_config, print_config};
use bookforge::infrastructure::adapters::{HttpLlmClient, HttpLlmClientConfig};
use bookforge::infrastructure::http::{AppState, HttpServer, ServerConfig};
use bookforge::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteBookRepository, SqliteChapterRepository,
    SqliteOutlineRepository,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},bookforge={},tower_http=debug",
        config.log.level, config.log.level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Bookforge - 书籍生成工作流");
    print_config(&config);

    if config.llm.api_key.is_empty() {
        tracing::warn!(
            "LLM API key not set; generation calls will store failure markers as content"
        );
    }

    // 确保数据目录存在
    tokio::fs::create_dir_all(&config.storage.books_dir).await?;
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 初始化数据库
    let db_config = DatabaseConfig {
        database_url: config.database.database_url(),
        max_connections: config.database.max_connections,
    };
    let pool = create_pool(&db_config).await?;
    run_migrations(&pool).await?;

    // 创建 Repository 适配器
    let book_repo = Arc::new(SqliteBookRepository::new(pool.clone()));
    let outline_repo = Arc::new(SqliteOutlineRepository::new(pool.clone()));
    let chapter_repo = Arc::new(SqliteChapterRepository::new(pool.clone()));

    // 创建 HTTP LLM 客户端
    let llm_config = HttpLlmClientConfig {
        base_url: config.llm.base_url.clone(),
        api_key: config.llm.api_key.clone(),
        model: config.llm.model.clone(),
        timeout_secs: config.llm.timeout_secs,
        max_retries: config.llm.max_retries,
    };
    let llm_engine = Arc::new(HttpLlmClient::new(llm_config)?);

    // 创建 HTTP 服务器
    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let state = AppState::new(
        book_repo,
        outline_repo,
        chapter_repo,
        llm_engine,
        config.storage.books_dir.clone(),
    );

    let server = HttpServer::new(server_config, state);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to listen for ctrl-c");
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
