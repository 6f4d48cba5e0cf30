//! In-memory backend for controller tests

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{DocumentApi, ProgressFn};
use crate::error::ApiError;
use crate::model::{Document, DocumentPreview, HistoryEntry, QueryResult, UploadProgress};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List,
    Upload(PathBuf),
    Delete(String),
    History(String),
    Query(String, String),
    Preview(String),
}

/// Scripted responses, consumed in order. An empty queue answers with an
/// empty success.
#[derive(Default)]
pub struct FakeApi {
    calls: Mutex<Vec<Call>>,
    lists: Mutex<VecDeque<Result<Vec<Document>, ApiError>>>,
    uploads: Mutex<VecDeque<Result<Document, ApiError>>>,
    deletes: Mutex<VecDeque<Result<(), ApiError>>>,
    histories: Mutex<VecDeque<Result<Vec<HistoryEntry>, ApiError>>>,
    queries: Mutex<VecDeque<Result<QueryResult, ApiError>>>,
    previews: Mutex<VecDeque<Result<DocumentPreview, ApiError>>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn push_list(&self, result: Result<Vec<Document>, ApiError>) {
        self.lists.lock().unwrap().push_back(result);
    }

    pub fn push_upload(&self, result: Result<Document, ApiError>) {
        self.uploads.lock().unwrap().push_back(result);
    }

    pub fn push_delete(&self, result: Result<(), ApiError>) {
        self.deletes.lock().unwrap().push_back(result);
    }

    pub fn push_history(&self, result: Result<Vec<HistoryEntry>, ApiError>) {
        self.histories.lock().unwrap().push_back(result);
    }

    pub fn push_query(&self, result: Result<QueryResult, ApiError>) {
        self.queries.lock().unwrap().push_back(result);
    }

    pub fn push_preview(&self, result: Result<DocumentPreview, ApiError>) {
        self.previews.lock().unwrap().push_back(result);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DocumentApi for FakeApi {
    async fn list_documents(&self) -> Result<Vec<Document>, ApiError> {
        self.record(Call::List);
        self.lists.lock().unwrap().pop_front().unwrap_or(Ok(Vec::new()))
    }

    async fn upload(&self, path: &Path, progress: ProgressFn) -> Result<Document, ApiError> {
        self.record(Call::Upload(path.to_path_buf()));
        progress(UploadProgress::from_bytes(1, 2));
        progress(UploadProgress::from_bytes(2, 2));
        self.uploads
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(document("generated", &path.display().to_string())))
    }

    async fn delete(&self, document_id: &str) -> Result<(), ApiError> {
        self.record(Call::Delete(document_id.to_string()));
        self.deletes.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    async fn history(&self, document_id: &str) -> Result<Vec<HistoryEntry>, ApiError> {
        self.record(Call::History(document_id.to_string()));
        self.histories.lock().unwrap().pop_front().unwrap_or(Ok(Vec::new()))
    }

    async fn query(&self, document_id: &str, question: &str) -> Result<QueryResult, ApiError> {
        self.record(Call::Query(document_id.to_string(), question.to_string()));
        self.queries
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(QueryResult::default()))
    }

    async fn preview(&self, document_id: &str) -> Result<DocumentPreview, ApiError> {
        self.record(Call::Preview(document_id.to_string()));
        self.previews.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(DocumentPreview {
                document_id: document_id.to_string(),
                preview_text: String::new(),
            })
        })
    }
}

pub fn document(id: &str, filename: &str) -> Document {
    Document {
        document_id: id.to_string(),
        filename: filename.to_string(),
        uploaded_at: "2024-05-01T10:20:30".to_string(),
        chunk_count: None,
        chunks_created: None,
        file_url: None,
        status: None,
    }
}

pub fn entry(question: &str, answer: &str) -> HistoryEntry {
    HistoryEntry {
        question: question.to_string(),
        answer: answer.to_string(),
        time: Some(0.5),
    }
}

pub fn backend_error(status: u16, detail: Option<&str>) -> ApiError {
    ApiError::Backend {
        status,
        detail: detail.map(str::to_string),
    }
}
