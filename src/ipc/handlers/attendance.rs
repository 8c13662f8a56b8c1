use rusqlite::Connection;
use serde_json::json;
use uuid::Uuid;

use super::students::require_student;
use crate::calc;
use crate::db;
use crate::ipc::helpers::{
    query_err, required_bool, required_date, required_str, required_year_month, respond, to_json,
    HandlerErr,
};
use crate::ipc::types::{AppState, Request};

/// Upsert by the (student, date) natural key: a second mark for the same day
/// updates the `present` flag instead of inserting a duplicate.
fn record(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = required_str(params, "studentId")?;
    let date = required_date(params, "date")?.to_string();
    let present = required_bool(params, "present")?;
    require_student(conn, &student_id)?;

    conn.execute(
        "INSERT INTO attendances(id, student_id, date, present)
         VALUES(?, ?, ?, ?)
         ON CONFLICT(student_id, date) DO UPDATE SET
           present = excluded.present",
        (
            Uuid::new_v4().to_string(),
            &student_id,
            &date,
            present as i64,
        ),
    )
    .map_err(|e| HandlerErr::db("db_update_failed", e))?;

    let stored = db::find_attendance(conn, &student_id, &date)
        .map_err(query_err)?
        .ok_or_else(|| HandlerErr::not_found("attendance record"))?;
    to_json(&stored)
}

fn delete(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = required_str(params, "studentId")?;
    let date = required_date(params, "date")?.to_string();
    let removed = conn
        .execute(
            "DELETE FROM attendances WHERE student_id = ? AND date = ?",
            [&student_id, &date],
        )
        .map_err(|e| HandlerErr::db("db_delete_failed", e))?;
    if removed == 0 {
        return Err(HandlerErr::not_found("attendance record"));
    }
    Ok(json!({ "deleted": true }))
}

/// Counts only days that have a record inside the month window; a student
/// with no records in the window gets zero counts, not an error.
fn monthly_summary(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = required_str(params, "studentId")?;
    let (year, month) = required_year_month(params)?;
    require_student(conn, &student_id)?;

    let (start, end) =
        calc::month_window(year, month).ok_or_else(|| HandlerErr::bad_params("invalid month"))?;
    let records =
        db::attendance_in_window(conn, &student_id, &start.to_string(), &end.to_string())
            .map_err(query_err)?;
    let totals = calc::attendance_totals(records.iter().map(|a| a.present));

    Ok(json!({
        "studentId": student_id,
        "year": year,
        "month": month,
        "totalDays": totals.total_days,
        "presentDays": totals.present_days
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.record" => Some(respond(state, req, record)),
        "attendance.delete" => Some(respond(state, req, delete)),
        "attendance.monthlySummary" => Some(respond(state, req, monthly_summary)),
        _ => None,
    }
}
