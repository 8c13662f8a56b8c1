
use serde_json::json;
use test_support::{request_ok, sidecar_with_student};

#[test]
fn payment_export_keeps_insertion_order_and_appends_column_totals() {
    let (mut child, mut stdin, mut reader, student_id) =
        sidecar_with_student("coachbook-export-payments", "2024A");

    // Deliberately out of date order: rows must come back in insertion order.
    for (i, (date, payment, paid)) in [
        ("2024-03-01", 5000.0, 3000.0),
        ("2024-01-15", 5000.0, 5000.0),
        ("2024-02-10", 4000.0, 4500.0),
    ]
    .iter()
    .enumerate()
    {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("p{}", i),
            "payments.create",
            json!({ "studentId": student_id, "date": date, "payment": payment, "paid": paid, "totalSubjects": 3 }),
        );
    }

    let export = request_ok(
        &mut stdin,
        &mut reader,
        "x",
        "exports.paymentHistory",
        json!({ "studentId": student_id }),
    );
    let rows = export.get("rows").and_then(|v| v.as_array()).expect("rows");
    assert_eq!(rows.len(), 3);
    let dates: Vec<&str> = rows
        .iter()
        .map(|r| r.get("date").and_then(|v| v.as_str()).expect("date"))
        .collect();
    assert_eq!(dates, vec!["2024-03-01", "2024-01-15", "2024-02-10"]);

    let statuses: Vec<&str> = rows
        .iter()
        .map(|r| r.get("status").and_then(|v| v.as_str()).expect("status"))
        .collect();
    assert_eq!(statuses, vec!["overdue", "settled", "settled"]);

    let totals = export.get("totals").expect("totals");
    assert_eq!(totals.get("payment").and_then(|v| v.as_f64()), Some(14000.0));
    assert_eq!(totals.get("paid").and_then(|v| v.as_f64()), Some(12500.0));
    assert_eq!(totals.get("due").and_then(|v| v.as_f64()), Some(1500.0));
    // total_subjects is a per-row attribute, never summed.
    assert!(totals.get("totalSubjects").is_none());

    let _ = child.kill();
}

#[test]
fn exam_export_sorts_rows_by_date_with_an_aligned_trend_series() {
    let (mut child, mut stdin, mut reader, student_id) =
        sidecar_with_student("coachbook-export-exams", "2024A");

    for (i, (date, subject, total, obtained)) in [
        ("2024-04-20", "Physics", 100.0, 50.0),
        ("2024-01-05", "Math", 100.0, 90.0),
        ("2024-02-14", "Mock", 0.0, 0.0),
    ]
    .iter()
    .enumerate()
    {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("e{}", i),
            "exams.create",
            json!({ "studentId": student_id, "date": date, "subjectName": subject, "totalMarks": total, "obtainedMarks": obtained }),
        );
    }

    let export = request_ok(
        &mut stdin,
        &mut reader,
        "x",
        "exports.examHistory",
        json!({ "studentId": student_id }),
    );
    let rows = export.get("rows").and_then(|v| v.as_array()).expect("rows");
    let dates: Vec<&str> = rows
        .iter()
        .map(|r| r.get("date").and_then(|v| v.as_str()).expect("date"))
        .collect();
    assert_eq!(dates, vec!["2024-01-05", "2024-02-14", "2024-04-20"]);

    let percentages: Vec<f64> = rows
        .iter()
        .map(|r| r.get("percentage").and_then(|v| v.as_f64()).expect("pct"))
        .collect();
    // Zero-marks mock exam projects as 0, not an error.
    assert_eq!(percentages, vec![90.0, 0.0, 50.0]);

    let trend = export.get("trend").and_then(|v| v.as_array()).expect("trend");
    assert_eq!(trend.len(), rows.len());
    for (point, row) in trend.iter().zip(rows.iter()) {
        assert_eq!(point.get("date"), row.get("date"));
        assert_eq!(point.get("percentage"), row.get("percentage"));
    }

    let _ = child.kill();
}

#[test]
fn exports_carry_student_identity_for_the_sheet_header() {
    let (mut child, mut stdin, mut reader, student_id) =
        sidecar_with_student("coachbook-export-header", "2024A");

    let export = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "exports.examHistory",
        json!({ "studentId": student_id }),
    );
    assert_eq!(
        export.get("studentId").and_then(|v| v.as_str()),
        Some(student_id.as_str())
    );
    assert_eq!(
        export.get("studentName").and_then(|v| v.as_str()),
        Some("Test Student")
    );
    // An empty history still projects: no rows, no trend, zero totals side.
    assert_eq!(
        export.get("rows").and_then(|v| v.as_array()).map(|a| a.len()),
        Some(0)
    );

    let _ = child.kill();
}
