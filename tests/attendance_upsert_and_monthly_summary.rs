
use serde_json::json;
use test_support::{request_err, request_ok, sidecar_with_student};

#[test]
fn second_mark_for_same_day_updates_instead_of_duplicating() {
    let (mut child, mut stdin, mut reader, student_id) =
        sidecar_with_student("coachbook-attendance-upsert", "2024A");

    let first = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "attendance.record",
        json!({ "studentId": student_id, "date": "2024-03-05", "present": true }),
    );
    assert_eq!(first.get("present").and_then(|v| v.as_bool()), Some(true));

    let second = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "attendance.record",
        json!({ "studentId": student_id, "date": "2024-03-05", "present": false }),
    );
    assert_eq!(second.get("present").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(first.get("id"), second.get("id"), "same row, flag updated");

    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "attendance.monthlySummary",
        json!({ "studentId": student_id, "year": 2024, "month": 3 }),
    );
    assert_eq!(summary.get("totalDays").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(summary.get("presentDays").and_then(|v| v.as_u64()), Some(0));

    let _ = child.kill();
}

#[test]
fn summary_counts_recorded_days_only_and_present_never_exceeds_total() {
    let (mut child, mut stdin, mut reader, student_id) =
        sidecar_with_student("coachbook-attendance-counts", "2024A");

    for (i, (date, present)) in [
        ("2024-03-01", true),
        ("2024-03-04", true),
        ("2024-03-07", false),
        ("2024-04-01", true), // outside the March window
    ]
    .iter()
    .enumerate()
    {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("a{}", i),
            "attendance.record",
            json!({ "studentId": student_id, "date": date, "present": present }),
        );
    }

    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "s",
        "attendance.monthlySummary",
        json!({ "studentId": student_id, "year": 2024, "month": 3 }),
    );
    let total = summary
        .get("totalDays")
        .and_then(|v| v.as_u64())
        .expect("totalDays");
    let present = summary
        .get("presentDays")
        .and_then(|v| v.as_u64())
        .expect("presentDays");
    assert_eq!(total, 3, "only days with a record count");
    assert_eq!(present, 2);
    assert!(present <= total);

    let _ = child.kill();
}

#[test]
fn december_window_rolls_into_next_january() {
    let (mut child, mut stdin, mut reader, student_id) =
        sidecar_with_student("coachbook-attendance-december", "2024A");

    for (i, date) in ["2024-12-01", "2024-12-31", "2025-01-01"].iter().enumerate() {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("a{}", i),
            "attendance.record",
            json!({ "studentId": student_id, "date": date, "present": true }),
        );
    }

    let december = request_ok(
        &mut stdin,
        &mut reader,
        "d",
        "attendance.monthlySummary",
        json!({ "studentId": student_id, "year": 2024, "month": 12 }),
    );
    assert_eq!(december.get("totalDays").and_then(|v| v.as_u64()), Some(2));

    let january = request_ok(
        &mut stdin,
        &mut reader,
        "j",
        "attendance.monthlySummary",
        json!({ "studentId": student_id, "year": 2025, "month": 1 }),
    );
    assert_eq!(january.get("totalDays").and_then(|v| v.as_u64()), Some(1));

    let _ = child.kill();
}

#[test]
fn empty_month_yields_zero_counts_not_an_error() {
    let (mut child, mut stdin, mut reader, student_id) =
        sidecar_with_student("coachbook-attendance-empty", "2024A");

    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "attendance.monthlySummary",
        json!({ "studentId": student_id, "year": 2023, "month": 6 }),
    );
    assert_eq!(summary.get("totalDays").and_then(|v| v.as_u64()), Some(0));
    assert_eq!(summary.get("presentDays").and_then(|v| v.as_u64()), Some(0));

    let _ = child.kill();
}

#[test]
fn unknown_student_and_bad_month_are_rejected() {
    let (mut child, mut stdin, mut reader, student_id) =
        sidecar_with_student("coachbook-attendance-errors", "2024A");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "attendance.monthlySummary",
        json!({ "studentId": "NOBODY-2024A", "year": 2024, "month": 3 }),
    );
    assert_eq!(code, "not_found");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "attendance.monthlySummary",
        json!({ "studentId": student_id, "year": 2024, "month": 13 }),
    );
    assert_eq!(code, "bad_params");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "attendance.record",
        json!({ "studentId": "NOBODY-2024A", "date": "2024-03-05", "present": true }),
    );
    assert_eq!(code, "not_found");

    let _ = child.kill();
}

#[test]
fn delete_removes_the_day_record() {
    let (mut child, mut stdin, mut reader, student_id) =
        sidecar_with_student("coachbook-attendance-delete", "2024A");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "attendance.record",
        json!({ "studentId": student_id, "date": "2024-03-05", "present": true }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "attendance.delete",
        json!({ "studentId": student_id, "date": "2024-03-05" }),
    );
    let code = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "attendance.delete",
        json!({ "studentId": student_id, "date": "2024-03-05" }),
    );
    assert_eq!(code, "not_found");

    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "attendance.monthlySummary",
        json!({ "studentId": student_id, "year": 2024, "month": 3 }),
    );
    assert_eq!(summary.get("totalDays").and_then(|v| v.as_u64()), Some(0));

    let _ = child.kill();
}
