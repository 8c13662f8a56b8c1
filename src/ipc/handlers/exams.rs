use rusqlite::Connection;
use serde_json::json;
use uuid::Uuid;

use super::students::require_student;
use crate::calc;
use crate::db;
use crate::ipc::helpers::{
    query_err, required_date, required_f64, required_i64, required_str, required_year_month,
    respond, to_json, HandlerErr,
};
use crate::ipc::types::{AppState, Request};

fn create(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = required_str(params, "studentId")?;
    let date = required_date(params, "date")?.to_string();
    let subject_name = required_str(params, "subjectName")?;
    let total_marks = required_f64(params, "totalMarks")?;
    let obtained_marks = required_f64(params, "obtainedMarks")?;
    require_student(conn, &student_id)?;

    let record = db::ExamRecord {
        id: Uuid::new_v4().to_string(),
        student_id,
        date,
        subject_name,
        total_marks,
        obtained_marks,
    };
    conn.execute(
        "INSERT INTO exam_history(id, student_id, date, subject_name, total_marks, obtained_marks)
         VALUES(?, ?, ?, ?, ?, ?)",
        (
            &record.id,
            &record.student_id,
            &record.date,
            &record.subject_name,
            record.total_marks,
            record.obtained_marks,
        ),
    )
    .map_err(|e| HandlerErr::db("db_insert_failed", e))?;

    to_json(&record)
}

fn student_history(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = required_str(params, "studentId")?;
    require_student(conn, &student_id)?;
    let exams = db::exams_for_student(conn, &student_id).map_err(query_err)?;
    Ok(json!({
        "studentId": student_id,
        "exams": to_json(&exams)?
    }))
}

fn list_by_year(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let year = required_i64(params, "year")? as i32;
    let exams = db::exams_by_year(conn, year).map_err(query_err)?;
    if exams.is_empty() {
        return Err(HandlerErr::new("not_found", "no exams found for this year"));
    }
    Ok(json!({ "year": year, "exams": to_json(&exams)? }))
}

fn list_by_month(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let (year, month) = required_year_month(params)?;
    let exams = db::exams_by_month(conn, year, month).map_err(query_err)?;
    if exams.is_empty() {
        return Err(HandlerErr::new("not_found", "no exams found for this month"));
    }
    Ok(json!({
        "year": year,
        "month": month,
        "exams": to_json(&exams)?
    }))
}

/// Aggregate percentage over the student's exams in one month. A month with
/// no exams is not_found; an all-zero mark denominator resolves to 0.
fn monthly_percentage(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = required_str(params, "studentId")?;
    let (year, month) = required_year_month(params)?;
    require_student(conn, &student_id)?;

    let exams =
        db::exams_for_student_month(conn, &student_id, year, month).map_err(query_err)?;
    if exams.is_empty() {
        return Err(HandlerErr::new(
            "not_found",
            "no exams found for this student in the specified month",
        ));
    }
    let percentage =
        calc::exam_percentage(exams.iter().map(|e| (e.total_marks, e.obtained_marks)));

    Ok(json!({
        "studentId": student_id,
        "year": year,
        "month": month,
        "percentage": percentage
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "exams.create" => Some(respond(state, req, create)),
        "exams.studentHistory" => Some(respond(state, req, student_history)),
        "exams.listByYear" => Some(respond(state, req, list_by_year)),
        "exams.listByMonth" => Some(respond(state, req, list_by_month)),
        "exams.monthlyPercentage" => Some(respond(state, req, monthly_percentage)),
        _ => None,
    }
}
