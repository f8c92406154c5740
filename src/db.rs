use sqlx::SqlitePool;

/// UTC timestamp in the same shape the schema's strftime defaults emit.
pub fn now_stamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub async fn init_db(pool: &SqlitePool) -> anyhow::Result<()> {
    // Pragmas for better durability/performance
    if let Err(e) = sqlx::query("PRAGMA journal_mode=WAL;").execute(pool).await {
        tracing::warn!("Failed to set WAL journal mode: {}", e);
    }
    if let Err(e) = sqlx::query("PRAGMA synchronous=NORMAL;").execute(pool).await {
        tracing::warn!("Failed to set synchronous mode: {}", e);
    }
    // Foreign keys are critical for the cascade deletes - fail if this doesn't work
    sqlx::query("PRAGMA foreign_keys=ON;").execute(pool).await?;
    if let Err(e) = sqlx::query("PRAGMA busy_timeout=10000;").execute(pool).await {
        tracing::warn!("Failed to set busy_timeout: {}", e);
    }

    // users table
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS users (
            user_id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now')),
            is_active INTEGER NOT NULL DEFAULT 1
        )"#,
    )
    .execute(pool)
    .await?;

    // profiles table (1:1 with users, created in the same transaction as the user)
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS profiles (
            user_id TEXT PRIMARY KEY,
            school TEXT NULL,
            rank INTEGER NULL,
            circumstances TEXT NULL,
            last_updated TEXT NULL,
            FOREIGN KEY(user_id) REFERENCES users(user_id) ON DELETE CASCADE
        )"#,
    )
    .execute(pool)
    .await?;

    // applications table
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS applications (
            application_id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            firm TEXT NULL,
            city TEXT NULL,
            networked TEXT NULL,
            applied_date TEXT NULL,
            applied_response_date TEXT NULL,
            applied_to_response INTEGER NULL,
            screener_date TEXT NULL,
            screener_response_date TEXT NULL,
            screener_to_response INTEGER NULL,
            callback_date TEXT NULL,
            callback_response_date TEXT NULL,
            callback_to_response INTEGER NULL,
            stage TEXT NOT NULL DEFAULT 'Not Submitted',
            last_updated TEXT NULL,
            FOREIGN KEY(user_id) REFERENCES users(user_id) ON DELETE CASCADE,
            UNIQUE(user_id, firm, city)
        )"#,
    )
    .execute(pool)
    .await?;

    // Additive migrations: notes arrived after the first deployments.
    for (table, column, ddl) in [("applications", "notes", "ALTER TABLE applications ADD COLUMN notes TEXT NULL")] {
        if let Err(e) = sqlx::query(ddl).execute(pool).await {
            match &e {
                sqlx::Error::Database(db_err) => {
                    let msg = db_err.message().to_lowercase();
                    if !msg.contains("duplicate") && !msg.contains("already exists") {
                        tracing::error!("Failed to add {} column to {}: {}", column, table, e);
                        return Err(anyhow::anyhow!("Migration failed: {}", e));
                    }
                }
                _ => {
                    tracing::error!("Unexpected error adding {} to {}: {}", column, table, e);
                    return Err(anyhow::anyhow!("Migration failed: {}", e));
                }
            }
        }
    }

    let indexes = [
        ("idx_users_email", "CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)"),
        ("idx_applications_firm", "CREATE INDEX IF NOT EXISTS idx_applications_firm ON applications(firm)"),
        (
            "idx_applications_user_updated",
            "CREATE INDEX IF NOT EXISTS idx_applications_user_updated ON applications(user_id, last_updated DESC)",
        ),
    ];

    for (name, query) in indexes {
        if let Err(e) = sqlx::query(query).execute(pool).await {
            match &e {
                sqlx::Error::Database(db_err) => {
                    let msg = db_err.message().to_lowercase();
                    if msg.contains("already exists") || msg.contains("duplicate") {
                        tracing::debug!("Index {} already exists, skipping", name);
                    } else {
                        tracing::warn!("Failed to create index {}: {}", name, e);
                    }
                }
                _ => {
                    tracing::warn!("Failed to create index {}: {}", name, e);
                }
            }
        }
    }

    Ok(())
}
