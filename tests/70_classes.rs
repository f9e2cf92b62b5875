mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn teacher_runs_a_class_and_takes_attendance() -> Result<()> {
    let app = common::spawn_app();
    let teacher = app.sign_up("teacher_1", "Ingrid Hansen", "teacher").await?;
    let student = app.sign_up("student_1", "Emil", "student").await?;
    let student_id = app.user_id(&student).await?;

    let (status, body) = app
        .post("/api/classes", &teacher, json!({ "name": "10A Matte", "grade": "10A", "subject": "Matematikk" }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let class_id = body["data"]["id"].as_str().unwrap_or_default().to_string();
    let students_uri = format!("/api/classes/{}/students", class_id);

    for _ in 0..2 {
        let (status, _) = app.post(&students_uri, &teacher, json!({ "student_id": student_id })).await?;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, body) = app.get(&students_uri, &teacher).await?;
    let members = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["name"], "Emil");

    let (_, body) = app.get("/api/classes", &student).await?;
    assert_eq!(body["data"][0]["name"], "10A Matte");

    let attendance_uri = format!("/api/classes/{}/attendance", class_id);
    for status in ["absent", "present"] {
        let (code, body) = app
            .post(
                &attendance_uri,
                &teacher,
                json!({ "student_id": student_id, "date": "2026-10-12", "status": status }),
            )
            .await?;
        assert_eq!(code, StatusCode::OK, "{}", body);
    }

    let (_, body) = app.get(&format!("{}?date=2026-10-12", attendance_uri), &teacher).await?;
    let records = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["status"], "present");

    let (_, body) = app.get(&format!("{}?date=2026-10-13", attendance_uri), &teacher).await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));

    let (_, body) = app.get("/api/attendance/me", &student).await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn only_the_owner_manages_a_class() -> Result<()> {
    let app = common::spawn_app();
    let owner = app.sign_up("teacher_1", "Ingrid Hansen", "teacher").await?;
    let other = app.sign_up("teacher_2", "Lars Johansen", "teacher").await?;
    let student = app.sign_up("student_1", "Emil", "student").await?;
    let student_id = app.user_id(&student).await?;

    let (_, body) = app
        .post("/api/classes", &owner, json!({ "name": "10A Norsk", "grade": "10A", "subject": "Norsk" }))
        .await?;
    let class_id = body["data"]["id"].as_str().unwrap_or_default().to_string();
    let students_uri = format!("/api/classes/{}/students", class_id);

    let (status, _) = app.post(&students_uri, &other, json!({ "student_id": student_id })).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post(
            &format!("/api/classes/{}/attendance", class_id),
            &owner,
            json!({ "student_id": student_id, "date": "2026-10-12", "status": "late" }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.post(&students_uri, &owner, json!({ "student_id": student_id })).await?;
    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("{}/{}", students_uri, student_id),
            Some(&owner),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app.get(&students_uri, &owner).await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn announcements_are_edited_by_their_author_only() -> Result<()> {
    let app = common::spawn_app();
    let author = app.sign_up("teacher_1", "Ingrid Hansen", "teacher").await?;
    let other = app.sign_up("teacher_2", "Lars Johansen", "teacher").await?;

    let (status, body) = app
        .post("/api/announcements", &author, json!({ "title": "Skidag", "content": "Husk varme klær" }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["author_name"], "Ingrid Hansen");
    let uri = format!("/api/announcements/{}", body["data"]["id"].as_str().unwrap_or_default());

    let update = json!({ "title": "Skidag", "content": "Husk lue" });
    let (status, _) = app.request(Method::PUT, &uri, Some(&other), Some(update.clone())).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.request(Method::PUT, &uri, Some(&author), Some(update)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["content"], "Husk lue");

    let (status, _) = app.request(Method::DELETE, &uri, Some(&author), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn achievements_setup_is_idempotent() -> Result<()> {
    let app = common::spawn_app();
    let student = app.sign_up("student_1", "Emil", "student").await?;

    let (_, first) = app.post("/api/achievements/setup", &student, json!({})).await?;
    assert_eq!(first["data"]["inserted"], 5);
    let (_, second) = app.post("/api/achievements/setup", &student, json!({})).await?;
    assert_eq!(second["data"]["inserted"], 0);

    let (_, body) = app.get("/api/achievements", &student).await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(5));
    Ok(())
}
