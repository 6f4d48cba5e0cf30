//! BackendClient against a stub backend served on an ephemeral port.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use docqa_core::{ApiError, BackendClient, DocumentApi, ProgressFn, UploadProgress};
use serde_json::json;

async fn list() -> impl IntoResponse {
    Json(json!({
        "documents": [
            {
                "document_id": "d1",
                "filename": "report.pdf",
                "uploaded_at": "2024-05-01T10:20:30.123456",
                "chunk_count": 4,
                "file_url": "https://storage.example/report.pdf"
            }
        ]
    }))
}

async fn upload(mut multipart: Multipart) -> impl IntoResponse {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map(|b| b.len()).unwrap_or(0);

        if filename == "huge.pdf" {
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({ "detail": "file too large" })),
            );
        }
        return (
            StatusCode::OK,
            Json(json!({
                "document_id": format!("id-{bytes}"),
                "filename": filename,
                "status": "processed",
                "chunks_created": 3,
                "uploaded_at": "2024-05-02T08:00:00"
            })),
        );
    }
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "detail": [{ "loc": ["body", "file"], "msg": "field required" }] })),
    )
}

async fn remove(Path(id): Path<String>) -> impl IntoResponse {
    if id == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Document Not Found" })),
        );
    }
    (StatusCode::OK, Json(json!({ "status": "deleted", "document_id": id })))
}

async fn history(Path(id): Path<String>) -> impl IntoResponse {
    Json(json!([
        { "question": format!("first about {id}"), "answer": "one", "time": 0.42 },
        { "question": "second", "answer": "two", "time": null }
    ]))
}

async fn query(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let doc = params.get("document_id").cloned().unwrap_or_default();
    let question = params.get("question").cloned().unwrap_or_default();
    Json(json!({
        "question": question,
        "answer": format!("{doc}: {question}"),
        "sources": [{ "chunk_text": "Y" }],
        "processing_time_seconds": 1.25
    }))
}

async fn text(Path(id): Path<String>) -> impl IntoResponse {
    Json(json!({ "document_id": id, "preview_text": "Executive summary" }))
}

async fn spawn_backend() -> String {
    let app = Router::new()
        .route("/api/documents", get(list))
        .route("/api/documents/upload", post(upload))
        .route("/api/documents/query", post(query))
        .route("/api/documents/:id", delete(remove))
        .route("/api/documents/:id/history", get(history))
        .route("/api/documents/:id/text", get(text));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}/api")
}

fn recording_progress() -> (ProgressFn, Arc<Mutex<Vec<u8>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let progress: ProgressFn = Arc::new(move |p: UploadProgress| {
        sink.lock().unwrap().push(p.percent);
    });
    (progress, seen)
}

#[tokio::test]
async fn lists_documents() {
    let client = BackendClient::new(&spawn_backend().await).unwrap();
    let docs = client.list_documents().await.unwrap();

    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].document_id, "d1");
    assert_eq!(docs[0].filename, "report.pdf");
    assert_eq!(docs[0].chunks(), Some(4));
}

#[tokio::test]
async fn uploads_file_as_multipart_with_progress() {
    let client = BackendClient::new(&spawn_backend().await).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.pdf");
    std::fs::write(&path, vec![b'x'; 200_000]).unwrap();

    let (progress, seen) = recording_progress();
    let doc = client.upload(&path, progress).await.unwrap();

    assert_eq!(doc.filename, "report.pdf");
    assert_eq!(doc.document_id, "id-200000");
    assert_eq!(doc.chunks(), Some(3));

    let seen = seen.lock().unwrap().clone();
    assert!(seen.len() > 1, "expected several progress updates, got {seen:?}");
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(seen.last(), Some(&100));
}

#[tokio::test]
async fn empty_upload_still_reports_completion() {
    let client = BackendClient::new(&spawn_backend().await).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.txt");
    std::fs::write(&path, b"").unwrap();

    let (progress, seen) = recording_progress();
    let doc = client.upload(&path, progress).await.unwrap();

    assert_eq!(doc.document_id, "id-0");
    assert_eq!(*seen.lock().unwrap(), vec![100]);
}

#[tokio::test]
async fn upload_error_carries_backend_detail() {
    let client = BackendClient::new(&spawn_backend().await).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("huge.pdf");
    std::fs::write(&path, b"%PDF-1.4").unwrap();

    let (progress, _) = recording_progress();
    let err = client.upload(&path, progress).await.unwrap_err();

    assert_eq!(err.status(), Some(413));
    assert_eq!(err.detail(), Some("file too large"));
}

#[tokio::test]
async fn upload_of_missing_file_is_io_error() {
    let client = BackendClient::new(&spawn_backend().await).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let (progress, seen) = recording_progress();
    let err = client
        .upload(&dir.path().join("nope.pdf"), progress)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Io { .. }));
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn deletes_and_reports_missing() {
    let client = BackendClient::new(&spawn_backend().await).unwrap();

    client.delete("d1").await.unwrap();

    let err = client.delete("missing").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.detail(), Some("Document Not Found"));
}

#[tokio::test]
async fn fetches_history() {
    let client = BackendClient::new(&spawn_backend().await).unwrap();
    let entries = client.history("d1").await.unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].question, "first about d1");
    assert_eq!(entries[0].time_label().as_deref(), Some("0.42s"));
    assert_eq!(entries[1].time, None);
}

#[tokio::test]
async fn queries_with_url_parameters() {
    let client = BackendClient::new(&spawn_backend().await).unwrap();
    let result = client.query("d1", "What is the summary?").await.unwrap();

    assert_eq!(result.answer_text(), "d1: What is the summary?");
    assert_eq!(result.sources.len(), 1);
    assert_eq!(result.sources[0].chunk_text, "Y");
    assert_eq!(result.processing_time_seconds, Some(1.25));
}

#[tokio::test]
async fn fetches_preview() {
    let client = BackendClient::new(&spawn_backend().await).unwrap();
    let preview = client.preview("d1").await.unwrap();

    assert_eq!(preview.document_id, "d1");
    assert_eq!(preview.preview_text, "Executive summary");
}

#[tokio::test]
async fn unreachable_backend_is_transport_error() {
    // Bind then drop to get a port nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = BackendClient::new(&format!("http://{addr}/api")).unwrap();
    let err = client.list_documents().await.unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)));
    assert_eq!(err.detail(), None);
}
