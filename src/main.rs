use anyhow::{Context, Result};
use newsfeed::{
    app::{
        trigger::IngestionTrigger,
        web::{create_app, AppState},
        workflow::IngestionPipeline,
    },
    domain::{
        article::ArticleStore, classifier::ClassifierStrategy, feed::resolve_feeds,
        rss::FetchOptions,
    },
    infra::{api::http::ReqwestHttpClient, storage::db::setup_database},
    types::AppConfig,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 環境変数を読み込み（.envファイルがあれば使用）
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().context("設定の読み込みに失敗")?;
    let pool = setup_database(&config.database_url)
        .await
        .context("データベースの初期化に失敗")?;
    let feeds = resolve_feeds(config.feeds_file.as_deref()).context("フィード設定の読み込みに失敗")?;
    tracing::info!(feeds = feeds.len(), database = %config.database_url, "初期化完了");

    let pipeline = IngestionPipeline::new(
        Arc::new(ReqwestHttpClient::new()),
        Arc::new(ClassifierStrategy::from_config(&config)),
        ArticleStore::new(pool),
        feeds,
        FetchOptions {
            timeout_secs: config.feed_timeout_secs,
            entry_limit: config.feed_entry_limit,
        },
    );

    // `ingest`指定時は1回だけ取り込んで終了
    if std::env::args().nth(1).as_deref() == Some("ingest") {
        let report = pipeline.run_ingestion().await;
        println!("{}", report);
        for error in &report.errors {
            eprintln!("  {}", error);
        }
        return Ok(());
    }

    let app = create_app(AppState::new(IngestionTrigger::new(pipeline)));
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("{}での待ち受けに失敗", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "HTTPサーバー起動");

    axum::serve(listener, app).await.context("HTTPサーバーが異常終了")?;
    Ok(())
}
