//! Call persistence and the live call feed for the Chama calling board.
//!
//! Implements the call record CRUD (insert, recent listing, bulk reset,
//! single delete), an async [`CallStore`] that publishes change
//! notifications, the feed projector that turns those notifications into
//! whole-state snapshots, and the selector that splits a snapshot into the
//! current call and its history.
//!
//! The free functions in this module take a plain `rusqlite::Connection` so
//! they can run inside `spawn_blocking` or directly in tests.

pub mod feed;
pub mod selector;
pub mod store;

pub use feed::{FeedProjector, FeedState, FeedSubscription};
pub use selector::{select_calls, CallSelection};
pub use store::CallStore;

use chama_types::{CallRecord, NewCall};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during call operations.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("database pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("call not found: {0}")]
    NotFound(String),
    #[error("database task failed: {0}")]
    Task(String),
}

/// Result of a bulk reset.
///
/// Both variants are successes; they differ so the caller can tell an
/// actual deletion from a reset of an already empty history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResetOutcome {
    /// `count` records were removed.
    Deleted { count: usize },
    /// There was nothing to remove.
    AlreadyEmpty,
}

const CALL_COLUMNS: &str =
    "call_id, patient_name, room_number, professional_name, seq, created_at";

/// Inserts a new call under a freshly generated ID.
pub fn insert_call(conn: &Connection, call: &NewCall) -> Result<CallRecord, CallError> {
    let call_id = Uuid::new_v4().to_string();
    let sql = format!(
        "INSERT INTO calls (call_id, patient_name, room_number, professional_name)
         VALUES (?1, ?2, ?3, ?4)
         RETURNING {CALL_COLUMNS}"
    );

    let record = conn.query_row(
        &sql,
        params![
            call_id,
            call.patient_name,
            call.room_number,
            call.professional_name,
        ],
        map_row_to_call,
    )?;

    tracing::debug!(call_id = %record.id, seq = record.seq, "call inserted");
    Ok(record)
}

/// Retrieves a call by its public ID.
pub fn get_call(conn: &Connection, call_id: &str) -> Result<CallRecord, CallError> {
    let sql = format!("SELECT {CALL_COLUMNS} FROM calls WHERE call_id = ?1");
    conn.query_row(&sql, [call_id], map_row_to_call)
        .optional()?
        .ok_or_else(|| CallError::NotFound(call_id.to_string()))
}

/// Lists the `limit` most recent calls, newest first.
pub fn list_recent_calls(conn: &Connection, limit: u32) -> Result<Vec<CallRecord>, CallError> {
    let sql = format!("SELECT {CALL_COLUMNS} FROM calls ORDER BY seq DESC LIMIT ?1");
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt.query_map([limit], map_row_to_call)?;
    let mut calls = Vec::new();
    for row in rows {
        calls.push(row?);
    }
    Ok(calls)
}

/// Deletes every call.
///
/// The delete is a single statement, so other connections observe either
/// the full history or an empty one, never a partial deletion.
pub fn delete_all_calls(conn: &Connection) -> Result<ResetOutcome, CallError> {
    let count = conn.execute("DELETE FROM calls", [])?;
    if count == 0 {
        return Ok(ResetOutcome::AlreadyEmpty);
    }
    Ok(ResetOutcome::Deleted { count })
}

/// Deletes a single call.
pub fn delete_call(conn: &Connection, call_id: &str) -> Result<(), CallError> {
    let count = conn.execute("DELETE FROM calls WHERE call_id = ?1", [call_id])?;
    if count == 0 {
        return Err(CallError::NotFound(call_id.to_string()));
    }
    Ok(())
}

/// Calls the same patient again: copies an existing record under a new ID.
pub fn recall(conn: &Connection, call_id: &str) -> Result<CallRecord, CallError> {
    let original = get_call(conn, call_id)?;
    insert_call(conn, &NewCall::from(&original))
}

fn map_row_to_call(row: &Row) -> rusqlite::Result<CallRecord> {
    Ok(CallRecord {
        id: row.get(0)?,
        patient_name: row.get(1)?,
        room_number: row.get(2)?,
        professional_name: row.get(3)?,
        seq: row.get(4)?,
        created_at: row.get(5)?,
    })
}
