//! SQLite-backed persistent storage for users and their records.
//!
//! Every record query is scoped by `user_id`; another user's record is
//! indistinguishable from a missing one. Arrays and embedded AI analysis are
//! stored as JSON text.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use mindcoach_shared::records::{
    AiConversation, ErrorCreate, ErrorEntry, MessengerCreate, MessengerEntry, MoodCreate,
    MoodEntry, PaintingCreate, PaintingEntry, Report, ReportCreate, User, UserUpdate,
};
use mindcoach_shared::{ChatMessage, MoodAnalysisResult};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// A user row together with its password material.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
    pub password_salt: String,
}

/// Store backed by SQLite
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
    db_path: Option<PathBuf>,
}

impl Store {
    /// Open or create the store at a specific path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {:?}", parent))?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {:?}", path))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: Some(path.to_path_buf()),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Private in-memory store (tests, throwaway runs)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: None,
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database lock poisoned"))
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                username TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                password_salt TEXT NOT NULL,
                exam_date TEXT,
                selected_subjects TEXT NOT NULL DEFAULT '[]',
                ai_companion_style TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                expires_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS moods (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                mood TEXT NOT NULL,
                intensity REAL NOT NULL,
                note TEXT,
                ai_analysis TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS errors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                description TEXT NOT NULL,
                image_url TEXT,
                ai_analysis TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS messengers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                message_type TEXT NOT NULL,
                content TEXT NOT NULL,
                sender TEXT NOT NULL,
                ai_analysis TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS paintings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                image_data_url TEXT NOT NULL,
                ai_analysis TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS reports (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                mood_trend_data TEXT NOT NULL,
                efficiency_mood_scatter_data TEXT NOT NULL,
                insights TEXT NOT NULL,
                suggestions TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS ai_conversations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                messages TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_moods_user ON moods(user_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_errors_user ON errors(user_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_messengers_user ON messengers(user_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_paintings_user ON paintings(user_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_reports_user ON reports(user_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_conversations_user ON ai_conversations(user_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_sessions_expiry ON sessions(expires_at);
            "#,
        )?;
        Ok(())
    }

    // ========================================================================
    // Users and sessions
    // ========================================================================

    pub fn email_exists(&self, email: &str) -> Result<bool> {
        let conn = self.conn()?;
        let found: Option<i64> = conn
            .query_row("SELECT id FROM users WHERE email = ?1", params![email], |r| r.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    pub fn create_user(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
        password_salt: &str,
    ) -> Result<Option<User>> {
        let now = Utc::now();
        let conn = self.conn()?;
        let inserted = conn.execute(
            r#"
            INSERT INTO users (email, username, password_hash, password_salt, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
            params![email, username, password_hash, password_salt, now],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        let id = conn.last_insert_rowid();
        let user = query_user(&conn, id)?.ok_or_else(|| anyhow!("user {} vanished after insert", id))?;
        Ok(Some(user))
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn()?;
        query_user(&conn, id)
    }

    pub fn user_credentials(&self, email: &str) -> Result<Option<UserCredentials>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {}, password_hash, password_salt FROM users WHERE email = ?1",
                    USER_COLUMNS
                ),
                params![email],
                |r| {
                    Ok(UserCredentials {
                        user: user_from_row(r)?,
                        password_hash: r.get(7)?,
                        password_salt: r.get(8)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Apply the set fields of `update` atomically; returns the refreshed user.
    pub fn update_user(&self, id: i64, update: &UserUpdate) -> Result<Option<User>> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;
        if let Some(exam_date) = update.exam_date {
            tx.execute(
                "UPDATE users SET exam_date = ?1 WHERE id = ?2",
                params![exam_date, id],
            )?;
        }
        if let Some(subjects) = &update.selected_subjects {
            tx.execute(
                "UPDATE users SET selected_subjects = ?1 WHERE id = ?2",
                params![to_json(subjects)?, id],
            )?;
        }
        if let Some(style) = &update.ai_companion_style {
            tx.execute(
                "UPDATE users SET ai_companion_style = ?1 WHERE id = ?2",
                params![style, id],
            )?;
        }
        if !update.is_empty() {
            tx.execute(
                "UPDATE users SET updated_at = ?1 WHERE id = ?2",
                params![Utc::now(), id],
            )?;
        }
        tx.commit()?;
        query_user(&conn, id)
    }

    pub fn insert_session(&self, token: &str, user_id: i64, expires_at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
            params![token, user_id, expires_at],
        )?;
        Ok(())
    }

    /// Owner of a live session. Expired sessions are deleted on sight.
    pub fn session_user(&self, token: &str, now: DateTime<Utc>) -> Result<Option<i64>> {
        let conn = self.conn()?;
        let row: Option<(i64, DateTime<Utc>)> = conn
            .query_row(
                "SELECT user_id, expires_at FROM sessions WHERE token = ?1",
                params![token],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;

        match row {
            Some((user_id, expires_at)) if expires_at > now => Ok(Some(user_id)),
            Some(_) => {
                conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        let conn = self.conn()?;
        let n = conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now])?;
        Ok(n)
    }

    // ========================================================================
    // Moods
    // ========================================================================

    pub fn create_mood(
        &self,
        user_id: i64,
        mood: &MoodCreate,
        analysis: Option<&MoodAnalysisResult>,
    ) -> Result<MoodEntry> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO moods (user_id, mood, intensity, note, ai_analysis, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                user_id,
                mood.mood,
                mood.intensity,
                mood.note,
                to_json_opt(analysis)?,
                Utc::now()
            ],
        )?;
        let id = conn.last_insert_rowid();
        query_one(&conn, MOOD_SELECT, user_id, id, mood_from_row)?
            .ok_or_else(|| anyhow!("mood {} vanished after insert", id))
    }

    pub fn list_moods(&self, user_id: i64) -> Result<Vec<MoodEntry>> {
        query_all(&*self.conn()?, MOOD_SELECT, user_id, None, mood_from_row)
    }

    pub fn latest_mood(&self, user_id: i64) -> Result<Option<MoodEntry>> {
        let mut moods = query_all(&*self.conn()?, MOOD_SELECT, user_id, Some(1), mood_from_row)?;
        Ok(moods.pop())
    }

    pub fn get_mood(&self, user_id: i64, id: i64) -> Result<Option<MoodEntry>> {
        query_one(&*self.conn()?, MOOD_SELECT, user_id, id, mood_from_row)
    }

    pub fn delete_mood(&self, user_id: i64, id: i64) -> Result<bool> {
        delete_owned(&*self.conn()?, "moods", user_id, id)
    }

    // ========================================================================
    // Errors (mistake log)
    // ========================================================================

    pub fn create_error(
        &self,
        user_id: i64,
        entry: &ErrorCreate,
        analysis: Option<&MoodAnalysisResult>,
    ) -> Result<ErrorEntry> {
        let now = Utc::now();
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO errors (user_id, description, image_url, ai_analysis, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
            params![
                user_id,
                entry.description,
                entry.image_url,
                to_json_opt(analysis)?,
                now
            ],
        )?;
        let id = conn.last_insert_rowid();
        query_one(&conn, ERROR_SELECT, user_id, id, error_from_row)?
            .ok_or_else(|| anyhow!("error entry {} vanished after insert", id))
    }

    pub fn list_errors(&self, user_id: i64) -> Result<Vec<ErrorEntry>> {
        query_all(&*self.conn()?, ERROR_SELECT, user_id, None, error_from_row)
    }

    pub fn get_error(&self, user_id: i64, id: i64) -> Result<Option<ErrorEntry>> {
        query_one(&*self.conn()?, ERROR_SELECT, user_id, id, error_from_row)
    }

    pub fn delete_error(&self, user_id: i64, id: i64) -> Result<bool> {
        delete_owned(&*self.conn()?, "errors", user_id, id)
    }

    // ========================================================================
    // Messengers
    // ========================================================================

    pub fn create_messenger(
        &self,
        user_id: i64,
        entry: &MessengerCreate,
        analysis: Option<&MoodAnalysisResult>,
    ) -> Result<MessengerEntry> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO messengers (user_id, message_type, content, sender, ai_analysis, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                user_id,
                entry.message_type,
                entry.content,
                entry.sender,
                to_json_opt(analysis)?,
                Utc::now()
            ],
        )?;
        let id = conn.last_insert_rowid();
        query_one(&conn, MESSENGER_SELECT, user_id, id, messenger_from_row)?
            .ok_or_else(|| anyhow!("messenger entry {} vanished after insert", id))
    }

    pub fn list_messengers(&self, user_id: i64) -> Result<Vec<MessengerEntry>> {
        query_all(&*self.conn()?, MESSENGER_SELECT, user_id, None, messenger_from_row)
    }

    pub fn get_messenger(&self, user_id: i64, id: i64) -> Result<Option<MessengerEntry>> {
        query_one(&*self.conn()?, MESSENGER_SELECT, user_id, id, messenger_from_row)
    }

    pub fn delete_messenger(&self, user_id: i64, id: i64) -> Result<bool> {
        delete_owned(&*self.conn()?, "messengers", user_id, id)
    }

    // ========================================================================
    // Paintings
    // ========================================================================

    pub fn create_painting(&self, user_id: i64, entry: &PaintingCreate) -> Result<PaintingEntry> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO paintings (user_id, image_data_url, created_at) VALUES (?1, ?2, ?3)",
            params![user_id, entry.image_data_url, Utc::now()],
        )?;
        let id = conn.last_insert_rowid();
        query_one(&conn, PAINTING_SELECT, user_id, id, painting_from_row)?
            .ok_or_else(|| anyhow!("painting {} vanished after insert", id))
    }

    pub fn list_paintings(&self, user_id: i64) -> Result<Vec<PaintingEntry>> {
        query_all(&*self.conn()?, PAINTING_SELECT, user_id, None, painting_from_row)
    }

    pub fn get_painting(&self, user_id: i64, id: i64) -> Result<Option<PaintingEntry>> {
        query_one(&*self.conn()?, PAINTING_SELECT, user_id, id, painting_from_row)
    }

    pub fn delete_painting(&self, user_id: i64, id: i64) -> Result<bool> {
        delete_owned(&*self.conn()?, "paintings", user_id, id)
    }

    // ========================================================================
    // Reports
    // ========================================================================

    pub fn create_report(&self, user_id: i64, report: &ReportCreate) -> Result<Report> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO reports (user_id, start_date, end_date, mood_trend_data,
                                 efficiency_mood_scatter_data, insights, suggestions, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                user_id,
                report.start_date,
                report.end_date,
                to_json(&report.mood_trend_data)?,
                to_json(&report.efficiency_mood_scatter_data)?,
                to_json(&report.insights)?,
                to_json(&report.suggestions)?,
                Utc::now()
            ],
        )?;
        let id = conn.last_insert_rowid();
        query_one(&conn, REPORT_SELECT, user_id, id, report_from_row)?
            .ok_or_else(|| anyhow!("report {} vanished after insert", id))
    }

    pub fn list_reports(&self, user_id: i64) -> Result<Vec<Report>> {
        query_all(&*self.conn()?, REPORT_SELECT, user_id, None, report_from_row)
    }

    pub fn get_report(&self, user_id: i64, id: i64) -> Result<Option<Report>> {
        query_one(&*self.conn()?, REPORT_SELECT, user_id, id, report_from_row)
    }

    pub fn delete_report(&self, user_id: i64, id: i64) -> Result<bool> {
        delete_owned(&*self.conn()?, "reports", user_id, id)
    }

    // ========================================================================
    // AI conversations
    // ========================================================================

    pub fn insert_conversation(
        &self,
        user_id: i64,
        messages: &[ChatMessage],
    ) -> Result<AiConversation> {
        let now = Utc::now();
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO ai_conversations (user_id, messages, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            "#,
            params![user_id, to_json(messages)?, now],
        )?;
        let id = conn.last_insert_rowid();
        query_one(&conn, CONVERSATION_SELECT, user_id, id, conversation_from_row)?
            .ok_or_else(|| anyhow!("conversation {} vanished after insert", id))
    }

    /// The `limit` most recent conversations, newest first.
    pub fn recent_conversations(&self, user_id: i64, limit: usize) -> Result<Vec<AiConversation>> {
        query_all(
            &*self.conn()?,
            CONVERSATION_SELECT,
            user_id,
            Some(limit),
            conversation_from_row,
        )
    }
}

// ============================================================================
// Row mapping
// ============================================================================

const USER_COLUMNS: &str =
    "id, email, username, exam_date, selected_subjects, ai_companion_style, created_at";

const MOOD_SELECT: &str =
    "SELECT id, user_id, mood, intensity, note, ai_analysis, created_at FROM moods";

const ERROR_SELECT: &str =
    "SELECT id, user_id, description, image_url, ai_analysis, created_at, updated_at FROM errors";

const MESSENGER_SELECT: &str =
    "SELECT id, user_id, message_type, content, sender, ai_analysis, created_at FROM messengers";

const PAINTING_SELECT: &str =
    "SELECT id, user_id, image_data_url, ai_analysis, created_at FROM paintings";

const REPORT_SELECT: &str = "SELECT id, user_id, start_date, end_date, mood_trend_data, efficiency_mood_scatter_data, insights, suggestions, created_at FROM reports";

const CONVERSATION_SELECT: &str =
    "SELECT id, user_id, messages, created_at, updated_at FROM ai_conversations";

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).context("Failed to encode JSON column")
}

fn to_json_opt<T: Serialize>(value: Option<&T>) -> Result<Option<String>> {
    value.map(to_json).transpose()
}

/// Decode a JSON text column, surfacing bad data as a conversion error.
fn json_col<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn json_col_opt<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| {
        serde_json::from_str(&t)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn query_user(conn: &Connection, id: i64) -> Result<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            params![id],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

fn query_one<T>(
    conn: &Connection,
    select: &str,
    user_id: i64,
    id: i64,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Option<T>> {
    let row = conn
        .query_row(
            &format!("{} WHERE user_id = ?1 AND id = ?2", select),
            params![user_id, id],
            map,
        )
        .optional()?;
    Ok(row)
}

fn query_all<T>(
    conn: &Connection,
    select: &str,
    user_id: i64,
    limit: Option<usize>,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>> {
    // -1 means no limit in SQLite
    let limit = limit.map(|l| l as i64).unwrap_or(-1);
    let mut stmt = conn.prepare(&format!(
        "{} WHERE user_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
        select
    ))?;
    let rows = stmt
        .query_map(params![user_id, limit], map)?
        .collect::<rusqlite::Result<Vec<T>>>()?;
    Ok(rows)
}

fn delete_owned(conn: &Connection, table: &str, user_id: i64, id: i64) -> Result<bool> {
    let n = conn.execute(
        &format!("DELETE FROM {} WHERE user_id = ?1 AND id = ?2", table),
        params![user_id, id],
    )?;
    Ok(n > 0)
}

fn user_from_row(r: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: r.get(0)?,
        email: r.get(1)?,
        username: r.get(2)?,
        exam_date: r.get(3)?,
        selected_subjects: json_col(r, 4)?,
        ai_companion_style: r.get(5)?,
        created_at: r.get(6)?,
    })
}

fn mood_from_row(r: &Row<'_>) -> rusqlite::Result<MoodEntry> {
    Ok(MoodEntry {
        id: r.get(0)?,
        user_id: r.get(1)?,
        mood: r.get(2)?,
        intensity: r.get(3)?,
        note: r.get(4)?,
        ai_analysis: json_col_opt(r, 5)?,
        created_at: r.get(6)?,
    })
}

fn error_from_row(r: &Row<'_>) -> rusqlite::Result<ErrorEntry> {
    Ok(ErrorEntry {
        id: r.get(0)?,
        user_id: r.get(1)?,
        description: r.get(2)?,
        image_url: r.get(3)?,
        ai_analysis: json_col_opt(r, 4)?,
        created_at: r.get(5)?,
        updated_at: r.get(6)?,
    })
}

fn messenger_from_row(r: &Row<'_>) -> rusqlite::Result<MessengerEntry> {
    Ok(MessengerEntry {
        id: r.get(0)?,
        user_id: r.get(1)?,
        message_type: r.get(2)?,
        content: r.get(3)?,
        sender: r.get(4)?,
        ai_analysis: json_col_opt(r, 5)?,
        created_at: r.get(6)?,
    })
}

fn painting_from_row(r: &Row<'_>) -> rusqlite::Result<PaintingEntry> {
    Ok(PaintingEntry {
        id: r.get(0)?,
        user_id: r.get(1)?,
        image_data_url: r.get(2)?,
        ai_analysis: json_col_opt(r, 3)?,
        created_at: r.get(4)?,
    })
}

fn report_from_row(r: &Row<'_>) -> rusqlite::Result<Report> {
    Ok(Report {
        id: r.get(0)?,
        user_id: r.get(1)?,
        start_date: r.get(2)?,
        end_date: r.get(3)?,
        mood_trend_data: json_col(r, 4)?,
        efficiency_mood_scatter_data: json_col(r, 5)?,
        insights: json_col(r, 6)?,
        suggestions: json_col(r, 7)?,
        created_at: r.get(8)?,
    })
}

fn conversation_from_row(r: &Row<'_>) -> rusqlite::Result<AiConversation> {
    Ok(AiConversation {
        id: r.get(0)?,
        user_id: r.get(1)?,
        messages: json_col(r, 2)?,
        created_at: r.get(3)?,
        updated_at: r.get(4)?,
    })
}
