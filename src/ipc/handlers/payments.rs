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

/// `due` is a stored, write-time-computed field. Every write path that
/// touches `payment` or `paid` recomputes it; it is never derived on read.
fn create(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = required_str(params, "studentId")?;
    let date = required_date(params, "date")?.to_string();
    let payment = required_f64(params, "payment")?;
    let paid = required_f64(params, "paid")?;
    let total_subjects = required_i64(params, "totalSubjects")?;
    require_student(conn, &student_id)?;

    let record = db::PaymentRecord {
        id: Uuid::new_v4().to_string(),
        student_id,
        date,
        payment,
        paid,
        due: calc::due_amount(payment, paid),
        total_subjects,
    };
    conn.execute(
        "INSERT INTO payment_history(id, student_id, date, payment, paid, due, total_subjects)
         VALUES(?, ?, ?, ?, ?, ?, ?)",
        (
            &record.id,
            &record.student_id,
            &record.date,
            record.payment,
            record.paid,
            record.due,
            record.total_subjects,
        ),
    )
    .map_err(|e| HandlerErr::db("db_insert_failed", e))?;

    to_json(&record)
}

/// Full-field replace of one payment record; the student link is immutable.
fn update(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let payment_id = required_str(params, "paymentId")?;
    let date = required_date(params, "date")?.to_string();
    let payment = required_f64(params, "payment")?;
    let paid = required_f64(params, "paid")?;
    let total_subjects = required_i64(params, "totalSubjects")?;

    let existing = db::get_payment(conn, &payment_id)
        .map_err(query_err)?
        .ok_or_else(|| HandlerErr::not_found("payment record"))?;

    let due = calc::due_amount(payment, paid);
    conn.execute(
        "UPDATE payment_history SET date = ?, payment = ?, paid = ?, due = ?, total_subjects = ?
         WHERE id = ?",
        (&date, payment, paid, due, total_subjects, &payment_id),
    )
    .map_err(|e| HandlerErr::db("db_update_failed", e))?;

    to_json(&db::PaymentRecord {
        id: payment_id,
        student_id: existing.student_id,
        date,
        payment,
        paid,
        due,
        total_subjects,
    })
}

fn delete(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = required_str(params, "studentId")?;
    let date = required_date(params, "date")?.to_string();
    let removed = conn
        .execute(
            "DELETE FROM payment_history
             WHERE id = (SELECT id FROM payment_history
                         WHERE student_id = ? AND date = ?
                         ORDER BY rowid LIMIT 1)",
            [&student_id, &date],
        )
        .map_err(|e| HandlerErr::db("db_delete_failed", e))?;
    if removed == 0 {
        return Err(HandlerErr::not_found("payment record"));
    }
    Ok(json!({ "deleted": true }))
}

fn student_history(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = required_str(params, "studentId")?;
    require_student(conn, &student_id)?;
    let payments = db::payments_for_student(conn, &student_id).map_err(query_err)?;
    Ok(json!({
        "studentId": student_id,
        "payments": to_json(&payments)?
    }))
}

fn list_by_year(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let year = required_i64(params, "year")? as i32;
    let payments = db::payments_by_year(conn, year).map_err(query_err)?;
    if payments.is_empty() {
        return Err(HandlerErr::new("not_found", "no payments found for this year"));
    }
    Ok(json!({ "year": year, "payments": to_json(&payments)? }))
}

fn list_by_month(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let (year, month) = required_year_month(params)?;
    let payments = db::payments_by_month(conn, year, month).map_err(query_err)?;
    if payments.is_empty() {
        return Err(HandlerErr::new(
            "not_found",
            "no payments found for this month",
        ));
    }
    Ok(json!({
        "year": year,
        "month": month,
        "payments": to_json(&payments)?
    }))
}

/// Outstanding balances across all students, natural insertion order. An
/// empty ledger is "nothing to report", surfaced as not_found.
fn list_due(conn: &Connection, _params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let payments = db::payments_with_due(conn).map_err(query_err)?;
    if payments.is_empty() {
        return Err(HandlerErr::new("not_found", "no due payments found"));
    }
    Ok(json!({ "payments": to_json(&payments)? }))
}

fn monthly_summary(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = required_str(params, "studentId")?;
    let (year, month) = required_year_month(params)?;
    require_student(conn, &student_id)?;

    let payments =
        db::payments_for_student_month(conn, &student_id, year, month).map_err(query_err)?;
    let totals = calc::payment_totals(&payments);

    Ok(json!({
        "studentId": student_id,
        "year": year,
        "month": month,
        "totalPayment": totals.total_payment,
        "totalPaid": totals.total_paid,
        "totalDue": totals.total_due
    }))
}

fn yearly_dues(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = required_str(params, "studentId")?;
    require_student(conn, &student_id)?;
    let payments = db::payments_for_student(conn, &student_id).map_err(query_err)?;
    let dues = calc::yearly_due_totals(&payments);
    Ok(json!({
        "studentId": student_id,
        "dues": to_json(&dues)?
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "payments.create" => Some(respond(state, req, create)),
        "payments.update" => Some(respond(state, req, update)),
        "payments.delete" => Some(respond(state, req, delete)),
        "payments.studentHistory" => Some(respond(state, req, student_history)),
        "payments.listByYear" => Some(respond(state, req, list_by_year)),
        "payments.listByMonth" => Some(respond(state, req, list_by_month)),
        "payments.listDue" => Some(respond(state, req, list_due)),
        "payments.monthlySummary" => Some(respond(state, req, monthly_summary)),
        "students.yearlyDues" => Some(respond(state, req, yearly_dues)),
        _ => None,
    }
}
