//! Document list, upload and delete
//!
//! The manager owns the landing screen's state. Backend calls run on spawned
//! tasks and report back as [`ManagerEvent`]s, which the owner feeds into
//! [`DocumentManager::apply`] on the UI thread.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use url::Url;

use crate::client::{DocumentApi, ProgressFn};
use crate::error::ApiError;
use crate::model::{Document, UploadProgress};
use crate::notify::Notifications;
use crate::route::Route;
use crate::sequence::{Sequencer, Slot, Ticket};

/// File types the backend can extract text from. Advisory only.
pub const ACCEPTED_EXTENSIONS: [&str; 2] = ["pdf", "txt"];

#[derive(Debug)]
pub enum ManagerEvent {
    Listed {
        ticket: Ticket,
        result: Result<Vec<Document>, ApiError>,
    },
    Progress {
        ticket: Ticket,
        progress: UploadProgress,
    },
    Uploaded {
        ticket: Ticket,
        result: Result<Document, ApiError>,
    },
    Deleted {
        document_id: String,
        result: Result<(), ApiError>,
    },
}

pub struct DocumentManager {
    api: Arc<dyn DocumentApi>,
    events: UnboundedSender<ManagerEvent>,
    sequencer: Sequencer,

    pub documents: Vec<Document>,
    /// True until the first list request resolves
    pub loading: bool,
    pub uploading: bool,
    pub progress: Option<UploadProgress>,

    selected_file: Option<PathBuf>,
    pending_delete: Option<String>,
}

impl DocumentManager {
    pub fn new(api: Arc<dyn DocumentApi>, events: UnboundedSender<ManagerEvent>) -> Self {
        Self {
            api,
            events,
            sequencer: Sequencer::new(),
            documents: Vec::new(),
            loading: true,
            uploading: false,
            progress: None,
            selected_file: None,
            pending_delete: None,
        }
    }

    /// Fetch the document list
    pub fn load(&mut self) {
        self.loading = true;
        let ticket = self.sequencer.issue(Slot::List);
        let api = Arc::clone(&self.api);
        let events = self.events.clone();

        tokio::spawn(async move {
            let result = api.list_documents().await;
            let _ = events.send(ManagerEvent::Listed { ticket, result });
        });
    }

    /// Make `path` the upload candidate, replacing any previous choice
    pub fn select_file(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        tracing::debug!(path = %path.display(), "file selected");
        self.selected_file = Some(path);
    }

    /// Treat text dropped onto the upload area as a file selection.
    ///
    /// Returns false when the text does not look like a path.
    pub fn drop_text(&mut self, text: &str) -> bool {
        match parse_dropped_path(text) {
            Some(path) => {
                self.select_file(path);
                true
            }
            None => false,
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected_file = None;
    }

    pub fn selected_file(&self) -> Option<&Path> {
        self.selected_file.as_deref()
    }

    pub fn upload(&mut self, notices: &mut Notifications) {
        if self.uploading {
            return;
        }
        let Some(path) = self.selected_file.clone() else {
            notices.error("Please select a file first!");
            return;
        };

        self.uploading = true;
        self.progress = Some(UploadProgress::default());

        let ticket = self.sequencer.issue(Slot::Upload);
        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        let progress_events = self.events.clone();
        let progress: ProgressFn = Arc::new(move |progress| {
            let _ = progress_events.send(ManagerEvent::Progress { ticket, progress });
        });

        tokio::spawn(async move {
            let result = api.upload(&path, progress).await;
            let _ = events.send(ManagerEvent::Uploaded { ticket, result });
        });
    }

    /// Ask for confirmation before deleting `document_id`
    pub fn request_delete(&mut self, document_id: impl Into<String>) {
        self.pending_delete = Some(document_id.into());
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    /// Resolve the pending confirmation. Nothing is sent unless confirmed.
    pub fn confirm_delete(&mut self, confirmed: bool) {
        let Some(document_id) = self.pending_delete.take() else {
            return;
        };
        if !confirmed {
            tracing::debug!(%document_id, "delete cancelled");
            return;
        }

        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = api.delete(&document_id).await;
            let _ = events.send(ManagerEvent::Deleted { document_id, result });
        });
    }

    /// Route that opens the question screen on `document_id`
    pub fn ask_route(&self, document_id: &str) -> Route {
        Route::Ask {
            doc: Some(document_id.to_string()),
        }
    }

    pub fn apply(&mut self, event: ManagerEvent, notices: &mut Notifications) {
        match event {
            ManagerEvent::Listed { ticket, result } => {
                if !self.sequencer.is_current(&ticket) {
                    return;
                }
                self.loading = false;
                match result {
                    Ok(documents) => self.documents = documents,
                    Err(e) => {
                        tracing::warn!(error = %e, "listing documents failed");
                        self.documents.clear();
                        notices.error("Failed to load documents");
                    }
                }
            }
            ManagerEvent::Progress { ticket, progress } => {
                if self.uploading && self.sequencer.is_current(&ticket) {
                    self.progress = Some(progress);
                }
            }
            ManagerEvent::Uploaded { ticket, result } => {
                if !self.sequencer.is_current(&ticket) {
                    return;
                }
                self.uploading = false;
                self.progress = None;
                match result {
                    Ok(document) => {
                        tracing::info!(document_id = %document.document_id, filename = %document.filename, "document uploaded");
                        self.documents.push(document);
                        self.selected_file = None;
                        notices.success("File uploaded successfully!");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "upload failed");
                        notices.error(format!("Upload failed: {}", e.detail().unwrap_or("Error")));
                    }
                }
            }
            ManagerEvent::Deleted { document_id, result } => match result {
                Ok(()) => {
                    tracing::info!(%document_id, "document deleted");
                    self.documents.retain(|d| d.document_id != document_id);
                    notices.success("Document deleted!");
                }
                Err(e) => {
                    tracing::warn!(%document_id, error = %e, "delete failed");
                    notices.error("Failed to delete document");
                }
            },
        }
    }
}

/// Whether `path` has one of the accepted extensions
pub fn accepts(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ACCEPTED_EXTENSIONS.iter().any(|a| a.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Terminals paste a file's path when it is dropped on them, quoted or
/// shell-escaped depending on the emulator.
pub fn parse_dropped_path(text: &str) -> Option<PathBuf> {
    let line = text.lines().map(str::trim).find(|l| !l.is_empty())?;

    let quoted = ['\'', '"']
        .iter()
        .find_map(|q| line.strip_prefix(*q).and_then(|rest| rest.strip_suffix(*q)));

    if let Some(inner) = quoted {
        if inner.starts_with("file://") {
            return Url::parse(inner).ok()?.to_file_path().ok();
        }
        // Quoted paths carry their backslashes literally
        return Some(PathBuf::from(inner));
    }

    if line.starts_with("file://") {
        return Url::parse(line).ok()?.to_file_path().ok();
    }

    if cfg!(windows) {
        return Some(PathBuf::from(line));
    }

    let mut path = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                path.push(escaped);
                continue;
            }
        }
        path.push(c);
    }

    Some(PathBuf::from(path))
}
