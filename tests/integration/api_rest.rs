// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests for the `/api/email` endpoints.

use actix_web::{http::StatusCode, test};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

use simplemail::imap::types::MessageFlag;
use simplemail::models::email::{
    DeleteResponse, EmailDetail, EmailSummary, MoveResponse, SavedAttachment, SentEmailSummary,
    StatusResponse,
};
use simplemail::services::smtp::SendEmailResponse;

use crate::common::{add_message, app_state, call, sample_mailbox, RecordingTransport, CAFE, SCANS};

fn uids(summaries: &[EmailSummary]) -> Vec<u32> {
    summaries.iter().map(|s| s.uid).collect()
}

#[actix_web::test]
async fn test_list_folders() {
    let mailbox = sample_mailbox();
    let dir = TempDir::new().unwrap();
    let state = app_state(mailbox.clone(), Arc::new(RecordingTransport::default()), dir.path());

    let resp = call(&state, test::TestRequest::get().uri("/api/email/folders")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Archive", "INBOX", "Sent"]);

    let state = mailbox.lock().unwrap();
    assert_eq!(state.logins, 1);
    assert_eq!(state.logouts, 1);
}

#[actix_web::test]
async fn test_inbox_returns_latest_first() {
    let dir = TempDir::new().unwrap();
    let state = app_state(sample_mailbox(), Arc::new(RecordingTransport::default()), dir.path());

    let resp = call(&state, test::TestRequest::get().uri("/api/email/inbox")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Vec<EmailSummary> = test::read_body_json(resp).await;
    assert_eq!(uids(&body), vec![3, 2, 1]);
    assert_eq!(body[0].from, "carol@example.com");
    assert_eq!(body[0].subject, "Lunch plans");
    assert!(body[0].date.starts_with("2025-07-02T11:15:00"));
    assert!(!body[0].seen);
    assert!(body[2].seen);

    let resp = call(&state, test::TestRequest::get().uri("/api/email/inbox?count=1")).await;
    let body: Vec<EmailSummary> = test::read_body_json(resp).await;
    assert_eq!(uids(&body), vec![3]);
}

#[actix_web::test]
async fn test_folder_pagination() {
    let dir = TempDir::new().unwrap();
    let state = app_state(sample_mailbox(), Arc::new(RecordingTransport::default()), dir.path());

    let resp = call(
        &state,
        test::TestRequest::get().uri("/api/email/folder?folderName=INBOX&limit=2&offset=1"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Vec<EmailSummary> = test::read_body_json(resp).await;
    assert_eq!(uids(&body), vec![2, 1]);

    let resp = call(&state, test::TestRequest::get().uri("/api/email/folder?folderName=Archive")).await;
    let body: Vec<EmailSummary> = test::read_body_json(resp).await;
    assert!(body.is_empty());
}

#[actix_web::test]
async fn test_read_status_filter() {
    let dir = TempDir::new().unwrap();
    let state = app_state(sample_mailbox(), Arc::new(RecordingTransport::default()), dir.path());

    let resp = call(
        &state,
        test::TestRequest::get().uri("/api/email/folder/read-status?folder=INBOX&seen=false"),
    )
    .await;
    let body: Vec<EmailSummary> = test::read_body_json(resp).await;
    assert_eq!(uids(&body), vec![3, 2]);

    let resp = call(
        &state,
        test::TestRequest::get().uri("/api/email/folder/read-status?folder=INBOX&seen=true"),
    )
    .await;
    let body: Vec<EmailSummary> = test::read_body_json(resp).await;
    assert_eq!(uids(&body), vec![1]);
}

#[actix_web::test]
async fn test_fetch_email_detail_does_not_mark_seen() {
    let mailbox = sample_mailbox();
    let dir = TempDir::new().unwrap();
    let state = app_state(mailbox.clone(), Arc::new(RecordingTransport::default()), dir.path());

    let resp = call(&state, test::TestRequest::get().uri("/api/email/fetch/2?folderName=INBOX")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let detail: EmailDetail = test::read_body_json(resp).await;

    assert_eq!(detail.uid, 2);
    assert_eq!(detail.from, "billing@example.com");
    assert_eq!(detail.to, vec!["me@example.com".to_string()]);
    assert_eq!(detail.subject, "Invoice 2025-07");
    assert_eq!(detail.text_body.as_deref().map(str::trim), Some("Your invoice is attached."));
    assert_eq!(detail.attachments.len(), 1);
    assert_eq!(detail.attachments[0].filename, "invoice.txt");
    assert!(!detail.seen);

    let state = mailbox.lock().unwrap();
    assert!(!state.message("INBOX", 2).unwrap().flags.contains(&MessageFlag::Seen));
}

#[actix_web::test]
async fn test_fetch_html_content() {
    let dir = TempDir::new().unwrap();
    let state = app_state(sample_mailbox(), Arc::new(RecordingTransport::default()), dir.path());

    let resp = call(
        &state,
        test::TestRequest::get().uri("/api/email/fetch/html-content/2?folderName=INBOX"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/html"));
    let body = test::read_body(resp).await;
    assert_eq!(String::from_utf8_lossy(&body).trim(), "<p>Your invoice is attached.</p>");

    let resp = call(
        &state,
        test::TestRequest::get().uri("/api/email/fetch/html-content/1?folderName=INBOX"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "HTML_CONTENT_NOT_FOUND");
}

#[actix_web::test]
async fn test_search_by_subject() {
    let dir = TempDir::new().unwrap();
    let state = app_state(sample_mailbox(), Arc::new(RecordingTransport::default()), dir.path());

    let resp = call(
        &state,
        test::TestRequest::get()
            .uri("/api/email/search?folderName=INBOX&keyword=lunch&searchField=SUBJECT"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Vec<EmailSummary> = test::read_body_json(resp).await;
    assert_eq!(uids(&body), vec![3]);

    let resp = call(
        &state,
        test::TestRequest::get()
            .uri("/api/email/search?folderName=INBOX&keyword=example.com&searchField=from"),
    )
    .await;
    let body: Vec<EmailSummary> = test::read_body_json(resp).await;
    assert_eq!(uids(&body), vec![3, 2, 1]);
}

#[actix_web::test]
async fn test_search_non_ascii_subject() {
    let mailbox = sample_mailbox();
    let uid = add_message(&mailbox, "INBOX", CAFE);
    let dir = TempDir::new().unwrap();
    let state = app_state(mailbox, Arc::new(RecordingTransport::default()), dir.path());

    let resp = call(
        &state,
        test::TestRequest::get()
            .uri("/api/email/search?folderName=INBOX&keyword=Caf%C3%A9&searchField=SUBJECT"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Vec<EmailSummary> = test::read_body_json(resp).await;
    assert_eq!(uids(&body), vec![uid]);
    assert_eq!(body[0].subject, "Café au lait");
}

#[actix_web::test]
async fn test_outbox_lists_sent_folder() {
    let dir = TempDir::new().unwrap();
    let state = app_state(sample_mailbox(), Arc::new(RecordingTransport::default()), dir.path());

    let resp = call(&state, test::TestRequest::get().uri("/api/email/outbox")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Vec<SentEmailSummary> = test::read_body_json(resp).await;
    assert_eq!(body.len(), 1);
    assert_eq!(body[0].id, "weekly-1@example.com");
    assert_eq!(body[0].to, "boss@example.com, team@example.com");
    assert_eq!(body[0].subject, "Weekly report");
}

#[actix_web::test]
async fn test_send_email() {
    let transport = Arc::new(RecordingTransport::default());
    let dir = TempDir::new().unwrap();
    let state = app_state(sample_mailbox(), transport.clone(), dir.path());

    let resp = call(
        &state,
        test::TestRequest::post().uri("/api/email/send").set_json(json!({
            "to": ["bob@example.com"],
            "cc": ["carol@example.com"],
            "subject": "Status",
            "text": "On track.",
            "html": "<p>On track.</p>"
        })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: SendEmailResponse = test::read_body_json(resp).await;
    assert!(body.success);

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("From: me@example.com"));
    assert!(sent[0].contains("To: bob@example.com"));
    assert!(sent[0].contains("Subject: Status"));
    assert!(sent[0].contains("multipart/alternative"));
}

#[actix_web::test]
async fn test_update_read_status_single() {
    let mailbox = sample_mailbox();
    let dir = TempDir::new().unwrap();
    let state = app_state(mailbox.clone(), Arc::new(RecordingTransport::default()), dir.path());

    let resp = call(
        &state,
        test::TestRequest::post().uri("/api/email/update-read-status/3?folder=INBOX&seen=true"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: StatusResponse = test::read_body_json(resp).await;
    assert_eq!(body.message, "Email marked as read");
    assert!(mailbox.lock().unwrap().message("INBOX", 3).unwrap().flags.contains(&MessageFlag::Seen));

    let resp = call(
        &state,
        test::TestRequest::post().uri("/api/email/update-read-status/1?folder=INBOX&seen=false"),
    )
    .await;
    let body: StatusResponse = test::read_body_json(resp).await;
    assert_eq!(body.message, "Email marked as unread");
    assert!(mailbox.lock().unwrap().message("INBOX", 1).unwrap().flags.is_empty());
}

#[actix_web::test]
async fn test_update_read_status_multiple() {
    let mailbox = sample_mailbox();
    let dir = TempDir::new().unwrap();
    let state = app_state(mailbox.clone(), Arc::new(RecordingTransport::default()), dir.path());

    let resp = call(
        &state,
        test::TestRequest::post()
            .uri("/api/email/update-read-status-multiple")
            .set_json(json!({"uids": [2, 3], "folderName": "INBOX", "seen": true})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let state = mailbox.lock().unwrap();
    assert!(state.folder("INBOX").iter().all(|m| m.flags.contains(&MessageFlag::Seen)));
}

#[actix_web::test]
async fn test_move_emails() {
    let mailbox = sample_mailbox();
    let dir = TempDir::new().unwrap();
    let state = app_state(mailbox.clone(), Arc::new(RecordingTransport::default()), dir.path());

    let resp = call(
        &state,
        test::TestRequest::post().uri("/api/email/move").set_json(json!({
            "uids": [1, 3, 77],
            "sourceFolder": "INBOX",
            "destinationFolder": "Archive"
        })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: MoveResponse = test::read_body_json(resp).await;
    assert_eq!(body.moved, 2);

    let state = mailbox.lock().unwrap();
    assert_eq!(state.folder("INBOX").len(), 1);
    assert_eq!(state.folder("Archive").len(), 2);
}

#[actix_web::test]
async fn test_delete_single_and_multiple() {
    let mailbox = sample_mailbox();
    let dir = TempDir::new().unwrap();
    let state = app_state(mailbox.clone(), Arc::new(RecordingTransport::default()), dir.path());

    let resp = call(&state, test::TestRequest::delete().uri("/api/email/delete/1?folderName=INBOX")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: DeleteResponse = test::read_body_json(resp).await;
    assert_eq!(body.deleted, 1);

    let resp = call(
        &state,
        test::TestRequest::delete()
            .uri("/api/email/delete-multiple")
            .set_json(json!({"uids": [2, 42], "folderName": "INBOX"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: DeleteResponse = test::read_body_json(resp).await;
    assert_eq!(body.deleted, 1);

    {
        let state = mailbox.lock().unwrap();
        let remaining: Vec<u32> = state.folder("INBOX").iter().map(|m| m.uid).collect();
        assert_eq!(remaining, vec![3]);
    }

    let resp = call(&state, test::TestRequest::delete().uri("/api/email/delete/1?folderName=INBOX")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_save_attachments() {
    let dir = TempDir::new().unwrap();
    let state = app_state(sample_mailbox(), Arc::new(RecordingTransport::default()), dir.path());

    let resp = call(
        &state,
        test::TestRequest::get().uri("/api/email/save-attachment?folderName=INBOX&uid=2&attachmentIndex=0"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let saved: SavedAttachment = test::read_body_json(resp).await;
    assert_eq!(saved.filename, "invoice.txt");
    assert_eq!(saved.path, dir.path().join("INBOX").join("2").join("invoice.txt"));
    let content = std::fs::read_to_string(&saved.path).unwrap();
    assert!(content.contains("Total: 42 EUR"));

    let resp = call(
        &state,
        test::TestRequest::get().uri("/api/email/save-all-attachments?folderName=INBOX&uid=2"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let saved: Vec<SavedAttachment> = test::read_body_json(resp).await;
    assert_eq!(saved.len(), 1);

    let resp = call(
        &state,
        test::TestRequest::get().uri("/api/email/save-attachment?folderName=INBOX&uid=2&attachmentIndex=5"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "ATTACHMENT_NOT_FOUND");
}

#[actix_web::test]
async fn test_save_all_keeps_equally_named_attachments() {
    let mailbox = sample_mailbox();
    let uid = add_message(&mailbox, "INBOX", SCANS);
    let dir = TempDir::new().unwrap();
    let state = app_state(mailbox, Arc::new(RecordingTransport::default()), dir.path());

    let resp = call(
        &state,
        test::TestRequest::get()
            .uri(&format!("/api/email/save-all-attachments?folderName=INBOX&uid={}", uid)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let saved: Vec<SavedAttachment> = test::read_body_json(resp).await;
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].filename, "scan.txt");
    assert_eq!(saved[1].filename, "scan_1.txt");
    assert_ne!(saved[0].path, saved[1].path);
    assert_eq!(std::fs::read_to_string(&saved[0].path).unwrap().trim(), "FIRST");
    assert_eq!(std::fs::read_to_string(&saved[1].path).unwrap().trim(), "SECOND");

    // Saving one by index lands on the same name as the bulk save
    let resp = call(
        &state,
        test::TestRequest::get().uri(&format!(
            "/api/email/save-attachment?folderName=INBOX&uid={}&attachmentIndex=1",
            uid
        )),
    )
    .await;
    let single: SavedAttachment = test::read_body_json(resp).await;
    assert_eq!(single.path, saved[1].path);
}
