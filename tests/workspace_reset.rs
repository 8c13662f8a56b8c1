
use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn reset_drops_all_records_and_leaves_a_usable_store() {
    let (mut child, mut stdin, mut reader, student_id) =
        test_support::sidecar_with_student("coachbook-reset", "2024A");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "payments.create",
        json!({ "studentId": student_id, "date": "2024-01-10", "payment": 5000.0, "paid": 3000.0, "totalSubjects": 3 }),
    );

    let _ = request_ok(&mut stdin, &mut reader, "2", "workspace.reset", json!({}));

    let code = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "students.get",
        json!({ "studentId": student_id }),
    );
    assert_eq!(code, "not_found");
    let code = request_err(&mut stdin, &mut reader, "4", "payments.listDue", json!({}));
    assert_eq!(code, "not_found");

    // The handle stays live: writes keep working against the fresh schema.
    let student = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.create",
        json!({ "name": "Post Reset", "hscBatch": "2025A" }),
    );
    assert!(student.get("id").and_then(|v| v.as_str()).is_some());

    let _ = child.kill();
}

#[test]
fn reset_requires_a_selected_workspace() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let code = request_err(&mut stdin, &mut reader, "1", "workspace.reset", json!({}));
    assert_eq!(code, "no_workspace");
    let _ = child.kill();
}

#[test]
fn reopening_the_same_workspace_sees_persisted_records() {
    let workspace = temp_dir("coachbook-reopen");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let student = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({ "name": "Persisted", "hscBatch": "2024A" }),
    );
    let student_id = student
        .get("id")
        .and_then(|v| v.as_str())
        .expect("id")
        .to_string();
    let _ = child.kill();

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let reloaded = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.get",
        json!({ "studentId": student_id }),
    );
    assert_eq!(
        reloaded.get("name").and_then(|v| v.as_str()),
        Some("Persisted")
    );
    let _ = child.kill();
}
