use rand::Rng;
use rusqlite::Connection;
use serde_json::json;

use crate::db;
use crate::ipc::helpers::{
    optional_str, query_err, required_str, respond, to_json, HandlerErr,
};
use crate::ipc::types::{AppState, Request};

const ID_TOKEN_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Student ids are `"{RANDOM6}-{hsc_batch}"`, minted once and immutable.
fn mint_student_id(hsc_batch: &str) -> String {
    let mut rng = rand::thread_rng();
    let token: String = (0..6)
        .map(|_| ID_TOKEN_CHARS[rng.gen_range(0..ID_TOKEN_CHARS.len())] as char)
        .collect();
    format!("{}-{}", token, hsc_batch)
}

pub fn require_student(
    conn: &Connection,
    student_id: &str,
) -> Result<db::Student, HandlerErr> {
    db::get_student(conn, student_id)
        .map_err(query_err)?
        .ok_or_else(|| HandlerErr::not_found("student"))
}

fn create(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let name = required_str(params, "name")?.trim().to_string();
    let hsc_batch = required_str(params, "hscBatch")?.trim().to_string();
    if name.is_empty() || hsc_batch.is_empty() {
        return Err(HandlerErr::bad_params("name/hscBatch must not be empty"));
    }
    let kb_batch = optional_str(params, "kbBatch");
    let phone = optional_str(params, "phone");
    let address = optional_str(params, "address");

    let student = db::Student {
        id: mint_student_id(&hsc_batch),
        name,
        hsc_batch,
        kb_batch,
        phone,
        address,
    };
    conn.execute(
        "INSERT INTO students(id, name, hsc_batch, kb_batch, phone, address)
         VALUES(?, ?, ?, ?, ?, ?)",
        (
            &student.id,
            &student.name,
            &student.hsc_batch,
            student.kb_batch.as_deref(),
            student.phone.as_deref(),
            student.address.as_deref(),
        ),
    )
    .map_err(|e| HandlerErr::db("db_insert_failed", e))?;

    to_json(&student)
}

fn list(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let offset = params.get("offset").and_then(|v| v.as_i64()).unwrap_or(0);
    let limit = params.get("limit").and_then(|v| v.as_i64()).unwrap_or(100);
    let students = db::list_students(conn, offset, limit).map_err(query_err)?;
    Ok(json!({ "students": to_json(&students)? }))
}

fn get(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = required_str(params, "studentId")?;
    let student = require_student(conn, &student_id)?;
    to_json(&student)
}

fn list_by_batch(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let kb_batch = required_str(params, "kbBatch")?;
    let students = db::students_by_batch(conn, &kb_batch).map_err(query_err)?;
    if students.is_empty() {
        return Err(HandlerErr::new(
            "not_found",
            "no students found for this batch",
        ));
    }
    Ok(json!({ "students": to_json(&students)? }))
}

/// Full-field replace over the enumerated field set; the id never changes.
fn update(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = required_str(params, "studentId")?;
    require_student(conn, &student_id)?;

    let name = required_str(params, "name")?.trim().to_string();
    let hsc_batch = required_str(params, "hscBatch")?.trim().to_string();
    if name.is_empty() || hsc_batch.is_empty() {
        return Err(HandlerErr::bad_params("name/hscBatch must not be empty"));
    }
    let kb_batch = optional_str(params, "kbBatch");
    let phone = optional_str(params, "phone");
    let address = optional_str(params, "address");

    conn.execute(
        "UPDATE students SET name = ?, hsc_batch = ?, kb_batch = ?, phone = ?, address = ?
         WHERE id = ?",
        (
            &name,
            &hsc_batch,
            kb_batch.as_deref(),
            phone.as_deref(),
            address.as_deref(),
            &student_id,
        ),
    )
    .map_err(|e| HandlerErr::db("db_update_failed", e))?;

    let student = require_student(conn, &student_id)?;
    to_json(&student)
}

/// Deleting a student takes its attendance, payment, and exam rows with it in
/// one transaction, so later per-student queries cannot leak orphans.
fn delete(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = required_str(params, "studentId")?;
    require_student(conn, &student_id)?;

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| HandlerErr::db("db_tx_failed", e))?;
    for table in ["exam_history", "payment_history", "attendances"] {
        tx.execute(
            &format!("DELETE FROM {} WHERE student_id = ?", table),
            [&student_id],
        )
        .map_err(|e| HandlerErr::db("db_delete_failed", e))?;
    }
    tx.execute("DELETE FROM students WHERE id = ?", [&student_id])
        .map_err(|e| HandlerErr::db("db_delete_failed", e))?;
    tx.commit()
        .map_err(|e| HandlerErr::db("db_commit_failed", e))?;

    Ok(json!({ "deleted": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.create" => Some(respond(state, req, create)),
        "students.list" => Some(respond(state, req, list)),
        "students.get" => Some(respond(state, req, get)),
        "students.listByBatch" => Some(respond(state, req, list_by_batch)),
        "students.update" => Some(respond(state, req, update)),
        "students.delete" => Some(respond(state, req, delete)),
        _ => None,
    }
}
