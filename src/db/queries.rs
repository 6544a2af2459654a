use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::CompletedOrder;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ── Completed orders ──

pub fn insert_completed_order(conn: &Connection, order: &CompletedOrder) -> anyhow::Result<()> {
    let lines = serde_json::to_string(&order.lines)?;
    let created_at = order.created_at.format(TIMESTAMP_FORMAT).to_string();

    conn.execute(
        "INSERT INTO completed_orders (id, session_id, summary, cups, lines, dining_mode, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            order.id,
            order.session_id,
            order.summary,
            order.cups,
            lines,
            order.dining_mode,
            created_at,
        ],
    )?;
    Ok(())
}

/// Newest first.
pub fn list_completed_orders(conn: &Connection, limit: i64) -> anyhow::Result<Vec<CompletedOrder>> {
    let mut stmt = conn.prepare(
        "SELECT id, session_id, summary, cups, lines, dining_mode, created_at
         FROM completed_orders ORDER BY created_at DESC, rowid DESC LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit], |row| Ok(parse_order_row(row)))?;

    let mut orders = vec![];
    for row in rows {
        orders.push(row??);
    }
    Ok(orders)
}

pub fn latest_order_for_session(
    conn: &Connection,
    session_id: &str,
) -> anyhow::Result<Option<CompletedOrder>> {
    let result = conn.query_row(
        "SELECT id, session_id, summary, cups, lines, dining_mode, created_at
         FROM completed_orders WHERE session_id = ?1
         ORDER BY created_at DESC, rowid DESC LIMIT 1",
        params![session_id],
        |row| Ok(parse_order_row(row)),
    );

    match result {
        Ok(order) => Ok(Some(order?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn set_dining_mode(conn: &Connection, id: &str, mode: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE completed_orders SET dining_mode = ?1 WHERE id = ?2",
        params![mode, id],
    )?;
    Ok(count > 0)
}

fn parse_order_row(row: &rusqlite::Row) -> anyhow::Result<CompletedOrder> {
    let lines_json: String = row.get(4)?;
    let created_at_str: String = row.get(6)?;

    let created_at = NaiveDateTime::parse_from_str(&created_at_str, TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(CompletedOrder {
        id: row.get(0)?,
        session_id: row.get(1)?,
        summary: row.get(2)?,
        cups: row.get(3)?,
        lines: serde_json::from_str(&lines_json).unwrap_or_else(|_| serde_json::json!([])),
        dining_mode: row.get(5)?,
        created_at,
    })
}
