use crate::types::{InfraError, InfraResult};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// データベース接続プールを作成
pub async fn create_pool(database_url: &str) -> InfraResult<SqlitePool> {
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(InfraError::database_connection)
}

/// テスト用のインメモリプールを作成
/// インメモリDBは接続ごとに別物になるため、接続は1本に固定する
pub async fn create_memory_pool() -> InfraResult<SqlitePool> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .map_err(InfraError::database_connection)
}

/// データベースの初期化（マイグレーション実行）
/// 適用済みのマイグレーションは再実行されないため、何度呼んでもよい
pub async fn initialize_database(pool: &SqlitePool) -> InfraResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|source| InfraError::Migration { source })
}

/// プールの作成とデータベース初期化を一括で行う便利関数
pub async fn setup_database(database_url: &str) -> InfraResult<SqlitePool> {
    let pool = create_pool(database_url).await?;
    initialize_database(&pool).await?;
    Ok(pool)
}

/// 疎通確認
pub async fn ping(pool: &SqlitePool) -> InfraResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(|e| InfraError::database_query("疎通確認", e))?;
    Ok(())
}
