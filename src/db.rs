use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use std::path::Path;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("coachbook.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    create_schema(&conn)?;
    Ok(conn)
}

fn create_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            hsc_batch TEXT NOT NULL,
            kb_batch TEXT,
            phone TEXT,
            address TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS attendances(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            date TEXT NOT NULL,
            present INTEGER NOT NULL,
            UNIQUE(student_id, date),
            FOREIGN KEY(student_id) REFERENCES students(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendances_student ON attendances(student_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendances_student_date ON attendances(student_id, date)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS payment_history(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            date TEXT NOT NULL,
            payment REAL NOT NULL,
            paid REAL NOT NULL,
            due REAL NOT NULL,
            total_subjects INTEGER NOT NULL,
            FOREIGN KEY(student_id) REFERENCES students(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_payment_history_student ON payment_history(student_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_payment_history_date ON payment_history(date)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS exam_history(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            date TEXT NOT NULL,
            subject_name TEXT NOT NULL,
            total_marks REAL NOT NULL,
            obtained_marks REAL NOT NULL,
            FOREIGN KEY(student_id) REFERENCES students(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_exam_history_student ON exam_history(student_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_exam_history_date ON exam_history(date)",
        [],
    )?;

    Ok(())
}

/// Drops every table and recreates the empty schema on the same connection.
/// The handle stays valid; no ambient global state is rebound.
pub fn reset_db(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "DROP TABLE IF EXISTS exam_history;
         DROP TABLE IF EXISTS payment_history;
         DROP TABLE IF EXISTS attendances;
         DROP TABLE IF EXISTS students;",
    )?;
    create_schema(conn)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub hsc_batch: String,
    pub kb_batch: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub student_id: String,
    pub date: String,
    pub present: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: String,
    pub student_id: String,
    pub date: String,
    pub payment: f64,
    pub paid: f64,
    pub due: f64,
    pub total_subjects: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamRecord {
    pub id: String,
    pub student_id: String,
    pub date: String,
    pub subject_name: String,
    pub total_marks: f64,
    pub obtained_marks: f64,
}

fn student_from_row(r: &Row) -> rusqlite::Result<Student> {
    Ok(Student {
        id: r.get(0)?,
        name: r.get(1)?,
        hsc_batch: r.get(2)?,
        kb_batch: r.get(3)?,
        phone: r.get(4)?,
        address: r.get(5)?,
    })
}

fn attendance_from_row(r: &Row) -> rusqlite::Result<AttendanceRecord> {
    Ok(AttendanceRecord {
        id: r.get(0)?,
        student_id: r.get(1)?,
        date: r.get(2)?,
        present: r.get::<_, i64>(3)? != 0,
    })
}

fn payment_from_row(r: &Row) -> rusqlite::Result<PaymentRecord> {
    Ok(PaymentRecord {
        id: r.get(0)?,
        student_id: r.get(1)?,
        date: r.get(2)?,
        payment: r.get(3)?,
        paid: r.get(4)?,
        due: r.get(5)?,
        total_subjects: r.get(6)?,
    })
}

fn exam_from_row(r: &Row) -> rusqlite::Result<ExamRecord> {
    Ok(ExamRecord {
        id: r.get(0)?,
        student_id: r.get(1)?,
        date: r.get(2)?,
        subject_name: r.get(3)?,
        total_marks: r.get(4)?,
        obtained_marks: r.get(5)?,
    })
}

const STUDENT_COLS: &str = "id, name, hsc_batch, kb_batch, phone, address";
const ATTENDANCE_COLS: &str = "id, student_id, date, present";
const PAYMENT_COLS: &str = "id, student_id, date, payment, paid, due, total_subjects";
const EXAM_COLS: &str = "id, student_id, date, subject_name, total_marks, obtained_marks";

pub fn get_student(conn: &Connection, student_id: &str) -> rusqlite::Result<Option<Student>> {
    conn.query_row(
        &format!("SELECT {STUDENT_COLS} FROM students WHERE id = ?"),
        [student_id],
        student_from_row,
    )
    .optional()
}

pub fn list_students(conn: &Connection, offset: i64, limit: i64) -> rusqlite::Result<Vec<Student>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {STUDENT_COLS} FROM students ORDER BY rowid LIMIT ? OFFSET ?"
    ))?;
    let rows = stmt.query_map([limit, offset], student_from_row)?;
    rows.collect()
}

pub fn students_by_batch(conn: &Connection, kb_batch: &str) -> rusqlite::Result<Vec<Student>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {STUDENT_COLS} FROM students WHERE kb_batch = ? ORDER BY rowid"
    ))?;
    let rows = stmt.query_map([kb_batch], student_from_row)?;
    rows.collect()
}

pub fn find_attendance(
    conn: &Connection,
    student_id: &str,
    date: &str,
) -> rusqlite::Result<Option<AttendanceRecord>> {
    conn.query_row(
        &format!("SELECT {ATTENDANCE_COLS} FROM attendances WHERE student_id = ? AND date = ?"),
        [student_id, date],
        attendance_from_row,
    )
    .optional()
}

/// All attendance rows for one student with date inside `[start, end]`
/// inclusive. Dates are ISO strings so lexicographic BETWEEN is chronological.
pub fn attendance_in_window(
    conn: &Connection,
    student_id: &str,
    start: &str,
    end: &str,
) -> rusqlite::Result<Vec<AttendanceRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ATTENDANCE_COLS} FROM attendances
         WHERE student_id = ? AND date BETWEEN ? AND ?
         ORDER BY date"
    ))?;
    let rows = stmt.query_map([student_id, start, end], attendance_from_row)?;
    rows.collect()
}

pub fn payments_for_student(
    conn: &Connection,
    student_id: &str,
) -> rusqlite::Result<Vec<PaymentRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PAYMENT_COLS} FROM payment_history WHERE student_id = ? ORDER BY rowid"
    ))?;
    let rows = stmt.query_map([student_id], payment_from_row)?;
    rows.collect()
}

pub fn get_payment(conn: &Connection, payment_id: &str) -> rusqlite::Result<Option<PaymentRecord>> {
    conn.query_row(
        &format!("SELECT {PAYMENT_COLS} FROM payment_history WHERE id = ?"),
        [payment_id],
        payment_from_row,
    )
    .optional()
}

pub fn payments_by_year(conn: &Connection, year: i32) -> rusqlite::Result<Vec<PaymentRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PAYMENT_COLS} FROM payment_history
         WHERE CAST(strftime('%Y', date) AS INTEGER) = ?
         ORDER BY rowid"
    ))?;
    let rows = stmt.query_map([year], payment_from_row)?;
    rows.collect()
}

pub fn payments_by_month(
    conn: &Connection,
    year: i32,
    month: u32,
) -> rusqlite::Result<Vec<PaymentRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PAYMENT_COLS} FROM payment_history
         WHERE CAST(strftime('%Y', date) AS INTEGER) = ?
           AND CAST(strftime('%m', date) AS INTEGER) = ?
         ORDER BY rowid"
    ))?;
    let rows = stmt.query_map((year, month), payment_from_row)?;
    rows.collect()
}

pub fn payments_for_student_month(
    conn: &Connection,
    student_id: &str,
    year: i32,
    month: u32,
) -> rusqlite::Result<Vec<PaymentRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PAYMENT_COLS} FROM payment_history
         WHERE student_id = ?
           AND CAST(strftime('%Y', date) AS INTEGER) = ?
           AND CAST(strftime('%m', date) AS INTEGER) = ?
         ORDER BY rowid"
    ))?;
    let rows = stmt.query_map((student_id, year, month), payment_from_row)?;
    rows.collect()
}

pub fn payments_with_due(conn: &Connection) -> rusqlite::Result<Vec<PaymentRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PAYMENT_COLS} FROM payment_history WHERE due > 0 ORDER BY rowid"
    ))?;
    let rows = stmt.query_map([], payment_from_row)?;
    rows.collect()
}

pub fn exams_for_student(
    conn: &Connection,
    student_id: &str,
) -> rusqlite::Result<Vec<ExamRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EXAM_COLS} FROM exam_history WHERE student_id = ? ORDER BY rowid"
    ))?;
    let rows = stmt.query_map([student_id], exam_from_row)?;
    rows.collect()
}

pub fn exams_by_year(conn: &Connection, year: i32) -> rusqlite::Result<Vec<ExamRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EXAM_COLS} FROM exam_history
         WHERE CAST(strftime('%Y', date) AS INTEGER) = ?
         ORDER BY rowid"
    ))?;
    let rows = stmt.query_map([year], exam_from_row)?;
    rows.collect()
}

pub fn exams_by_month(
    conn: &Connection,
    year: i32,
    month: u32,
) -> rusqlite::Result<Vec<ExamRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EXAM_COLS} FROM exam_history
         WHERE CAST(strftime('%Y', date) AS INTEGER) = ?
           AND CAST(strftime('%m', date) AS INTEGER) = ?
         ORDER BY rowid"
    ))?;
    let rows = stmt.query_map((year, month), exam_from_row)?;
    rows.collect()
}

pub fn exams_for_student_month(
    conn: &Connection,
    student_id: &str,
    year: i32,
    month: u32,
) -> rusqlite::Result<Vec<ExamRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EXAM_COLS} FROM exam_history
         WHERE student_id = ?
           AND CAST(strftime('%Y', date) AS INTEGER) = ?
           AND CAST(strftime('%m', date) AS INTEGER) = ?
         ORDER BY rowid"
    ))?;
    let rows = stmt.query_map((student_id, year, month), exam_from_row)?;
    rows.collect()
}
