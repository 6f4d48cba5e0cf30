use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use url::Url;

use crate::error::{extract_detail, ApiError};
use crate::model::{Document, DocumentList, DocumentPreview, HistoryEntry, QueryResult, UploadProgress};

/// Size of each slice of the upload body handed to the transport
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Receives upload progress as the request body is streamed
pub type ProgressFn = Arc<dyn Fn(UploadProgress) + Send + Sync>;

/// Operations the document backend offers.
///
/// Screen controllers only talk to the backend through this trait.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    async fn list_documents(&self) -> Result<Vec<Document>, ApiError>;

    async fn upload(&self, path: &Path, progress: ProgressFn) -> Result<Document, ApiError>;

    async fn delete(&self, document_id: &str) -> Result<(), ApiError>;

    async fn history(&self, document_id: &str) -> Result<Vec<HistoryEntry>, ApiError>;

    async fn query(&self, document_id: &str, question: &str) -> Result<QueryResult, ApiError>;

    async fn preview(&self, document_id: &str) -> Result<DocumentPreview, ApiError>;
}

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: Url,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url.trim_end_matches('/')).map_err(|e| ApiError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl {
                url: base_url.to_string(),
                reason: "not a base url".to_string(),
            });
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    /// Build `{base}/documents/<segments...>`, percent-encoding each segment
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("documents").extend(segments);
        }
        url
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = extract_detail(&body);
        tracing::warn!(status = status.as_u16(), detail = ?detail, "backend request failed");

        Err(ApiError::Backend {
            status: status.as_u16(),
            detail,
        })
    }
}

#[async_trait]
impl DocumentApi for BackendClient {
    async fn list_documents(&self) -> Result<Vec<Document>, ApiError> {
        let url = self.endpoint(&[]);
        tracing::debug!(%url, "listing documents");

        let response = self.client.get(url).send().await?;
        let list: DocumentList = Self::check(response).await?.json().await?;
        Ok(list.documents)
    }

    async fn upload(&self, path: &Path, progress: ProgressFn) -> Result<Document, ApiError> {
        let url = self.endpoint(&["upload"]);

        let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let total = bytes.len() as u64;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        tracing::debug!(%url, %filename, bytes = total, "uploading document");

        // An empty body yields no chunks, so report completion up front
        if total == 0 {
            progress(UploadProgress::from_bytes(0, 0));
        }

        let chunks: Vec<Vec<u8>> = bytes.chunks(UPLOAD_CHUNK_SIZE).map(<[u8]>::to_vec).collect();
        let mut sent: u64 = 0;
        let mut last_percent: Option<u8> = None;
        let body_stream = stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            let update = UploadProgress::from_bytes(sent, total);
            if last_percent != Some(update.percent) {
                last_percent = Some(update.percent);
                progress(update);
            }
            Ok::<_, std::io::Error>(chunk)
        }));

        let part = Part::stream_with_length(Body::wrap_stream(body_stream), total)
            .file_name(filename.clone())
            .mime_str(mime_for(&filename))?;
        let form = Form::new().part("file", part);

        let response = self.client.post(url).multipart(form).send().await?;
        let document: Document = Self::check(response).await?.json().await?;
        Ok(document)
    }

    async fn delete(&self, document_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&[document_id]);
        tracing::debug!(%url, "deleting document");

        let response = self.client.delete(url).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn history(&self, document_id: &str) -> Result<Vec<HistoryEntry>, ApiError> {
        let url = self.endpoint(&[document_id, "history"]);
        tracing::debug!(%url, "fetching history");

        let response = self.client.get(url).send().await?;
        let entries: Vec<HistoryEntry> = Self::check(response).await?.json().await?;
        Ok(entries)
    }

    async fn query(&self, document_id: &str, question: &str) -> Result<QueryResult, ApiError> {
        let url = self.endpoint(&["query"]);
        tracing::debug!(%url, document_id, "querying document");

        let response = self
            .client
            .post(url)
            .query(&[("document_id", document_id), ("question", question)])
            .send()
            .await?;
        let result: QueryResult = Self::check(response).await?.json().await?;
        Ok(result)
    }

    async fn preview(&self, document_id: &str) -> Result<DocumentPreview, ApiError> {
        let url = self.endpoint(&[document_id, "text"]);
        tracing::debug!(%url, "fetching preview");

        let response = self.client.get(url).send().await?;
        let preview: DocumentPreview = Self::check(response).await?.json().await?;
        Ok(preview)
    }
}

fn mime_for(filename: &str) -> &'static str {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".pdf") {
        "application/pdf"
    } else if lower.ends_with(".txt") {
        "text/plain"
    } else {
        "application/octet-stream"
    }
}
