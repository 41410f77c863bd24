use async_trait::async_trait;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::debug;

use super::{ActivityRecord, NewActivityRecord, RecordStore};
use crate::error::GatewayError;

/// Record store backed by a SQLite file
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
    table: String,
}

impl SqliteRecordStore {
    /// Create or open a database at the specified path
    pub fn open<P: AsRef<Path>>(db_path: P, table: &str) -> Result<Self, GatewayError> {
        if let Some(parent) = db_path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|source| GatewayError::LocalFile {
                path: parent.display().to_string(),
                source,
            })?;
        }
        Self::with_connection(Connection::open(db_path)?, table)
    }

    pub fn open_in_memory(table: &str) -> Result<Self, GatewayError> {
        Self::with_connection(Connection::open_in_memory()?, table)
    }

    fn with_connection(conn: Connection, table: &str) -> Result<Self, GatewayError> {
        if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(GatewayError::InvalidTable(table.to_string()));
        }

        conn.execute(
            &format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    created_at DATETIME NOT NULL,
                    calories TEXT NOT NULL,
                    distance TEXT NOT NULL,
                    "heartRate" TEXT NOT NULL,
                    breathing TEXT NOT NULL,
                    duration TEXT NOT NULL,
                    "userId" TEXT NOT NULL
                )
                "#,
                table
            ),
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            table: table.to_string(),
        })
    }

    fn record_from_row(row: &Row) -> rusqlite::Result<ActivityRecord> {
        Ok(ActivityRecord {
            id: row.get("id")?,
            record: NewActivityRecord {
                created_at: row.get("created_at")?,
                calories: row.get("calories")?,
                distance: row.get("distance")?,
                heart_rate: row.get("heartRate")?,
                breathing: row.get("breathing")?,
                duration: row.get("duration")?,
                user_id: row.get("userId")?,
            },
        })
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert(&self, record: &NewActivityRecord) -> Result<(), GatewayError> {
        let conn = self.conn.lock().await;
        conn.execute(
            &format!(
                r#"
                INSERT INTO {} (
                    created_at, calories, distance, "heartRate", breathing, duration, "userId"
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                self.table
            ),
            params![
                record.created_at,
                record.calories,
                record.distance,
                record.heart_rate,
                record.breathing,
                record.duration,
                record.user_id,
            ],
        )?;
        debug!(table = %self.table, id = conn.last_insert_rowid(), "Record stored locally");
        Ok(())
    }

    async fn select_all(&self) -> Result<Vec<ActivityRecord>, GatewayError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!("SELECT * FROM {} ORDER BY id", self.table))?;
        let rows = stmt.query_map([], Self::record_from_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}
