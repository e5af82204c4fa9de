use chrono::{SecondsFormat, Utc};
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::invite::InviteCode;

pub const GENERATED_CODE_LEN: usize = 8;
pub const MAX_BATCH: usize = 100;
/// Fresh draws allowed when a generated code collides with a stored one.
const MAX_GENERATION_ATTEMPTS: usize = 5;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

type InviteRow = (String, bool, String, Option<String>);

fn from_row(row: InviteRow) -> InviteCode {
    InviteCode {
        code: row.0,
        used: row.1,
        created_at: row.2,
        used_at: row.3,
    }
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Result of trying to consume a code.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsumeOutcome {
    Consumed(InviteCode),
    NotFound,
    AlreadyUsed,
}

pub fn generate_code() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..GENERATED_CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

pub async fn get(pool: &SqlitePool, code: &str) -> Result<Option<InviteCode>, AppError> {
    let row = sqlx::query_as::<_, InviteRow>(
        "SELECT code, used, created_at, used_at FROM invite_codes WHERE code = ?",
    )
    .bind(code)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(from_row))
}

pub async fn list_all(pool: &SqlitePool) -> Result<Vec<InviteCode>, AppError> {
    let rows = sqlx::query_as::<_, InviteRow>(
        "SELECT code, used, created_at, used_at FROM invite_codes ORDER BY created_at, code",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(from_row).collect())
}

pub async fn create(pool: &SqlitePool, code: &str) -> Result<InviteCode, AppError> {
    let created_at = now_timestamp();

    sqlx::query("INSERT INTO invite_codes (code, used, created_at) VALUES (?, 0, ?)")
        .bind(code)
        .bind(&created_at)
        .execute(pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateCode(code.to_string())
            } else {
                AppError::Database(e)
            }
        })?;

    Ok(InviteCode {
        code: code.to_string(),
        used: false,
        created_at,
        used_at: None,
    })
}

/// Creates `count` random codes in one transaction: either all of them
/// are stored or none are.
pub async fn create_batch(pool: &SqlitePool, count: usize) -> Result<Vec<String>, AppError> {
    if count == 0 || count > MAX_BATCH {
        return Err(AppError::InvalidInput(format!(
            "count must be between 1 and {MAX_BATCH}"
        )));
    }

    let mut tx = pool.begin().await?;
    let mut codes = Vec::with_capacity(count);

    for _ in 0..count {
        let mut attempts = 0;
        let code = loop {
            attempts += 1;
            let candidate = generate_code();
            let inserted =
                sqlx::query("INSERT INTO invite_codes (code, used, created_at) VALUES (?, 0, ?)")
                    .bind(&candidate)
                    .bind(now_timestamp())
                    .execute(&mut *tx)
                    .await;
            match inserted {
                Ok(_) => break candidate,
                Err(e) if is_unique_violation(&e) && attempts < MAX_GENERATION_ATTEMPTS => {
                    tracing::debug!("generated invite code collided, drawing again");
                }
                Err(e) if is_unique_violation(&e) => {
                    return Err(AppError::Unexpected(format!(
                        "could not generate a unique invite code after {attempts} attempts"
                    )));
                }
                Err(e) => return Err(e.into()),
            }
        };
        codes.push(code);
    }

    tx.commit().await?;
    Ok(codes)
}

/// Marks `code` used if, and only if, it is currently unused.
///
/// The check and the write are one conditional `UPDATE`, so the database
/// decides the single winner even across processes sharing the file.
pub async fn find_and_consume(pool: &SqlitePool, code: &str) -> Result<ConsumeOutcome, AppError> {
    let consumed = sqlx::query_as::<_, InviteRow>(
        "UPDATE invite_codes SET used = 1, used_at = ? WHERE code = ? AND used = 0 \
         RETURNING code, used, created_at, used_at",
    )
    .bind(now_timestamp())
    .bind(code)
    .fetch_optional(pool)
    .await?;

    if let Some(row) = consumed {
        return Ok(ConsumeOutcome::Consumed(from_row(row)));
    }

    // Lost the race or never existed; a used code never flips back.
    match get(pool, code).await? {
        Some(_) => Ok(ConsumeOutcome::AlreadyUsed),
        None => Ok(ConsumeOutcome::NotFound),
    }
}
