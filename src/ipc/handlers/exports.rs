use rusqlite::Connection;
use serde_json::json;

use super::students::require_student;
use crate::db;
use crate::export;
use crate::ipc::helpers::{query_err, required_str, respond, to_json, HandlerErr};
use crate::ipc::types::{AppState, Request};

fn payment_history(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = required_str(params, "studentId")?;
    let student = require_student(conn, &student_id)?;
    let payments = db::payments_for_student(conn, &student_id).map_err(query_err)?;
    let projection = export::project_payment_history(&payments);

    Ok(json!({
        "studentId": student.id,
        "studentName": student.name,
        "rows": to_json(&projection.rows)?,
        "totals": to_json(&projection.totals)?
    }))
}

fn exam_history(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = required_str(params, "studentId")?;
    let student = require_student(conn, &student_id)?;
    let exams = db::exams_for_student(conn, &student_id).map_err(query_err)?;
    let projection = export::project_exam_history(&exams);

    Ok(json!({
        "studentId": student.id,
        "studentName": student.name,
        "rows": to_json(&projection.rows)?,
        "trend": to_json(&projection.trend)?
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "exports.paymentHistory" => Some(respond(state, req, payment_history)),
        "exports.examHistory" => Some(respond(state, req, exam_history)),
        _ => None,
    }
}
