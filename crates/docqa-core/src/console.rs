//! Question screen: document selection, history, asking and answers
//!
//! Like the document manager, every backend call is spawned and reports
//! back through [`ConsoleEvent`]. Responses are tagged so that only the
//! latest request per slot can change what is shown.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedSender;

use crate::client::DocumentApi;
use crate::error::ApiError;
use crate::model::{Document, DocumentPreview, HistoryEntry, QueryResult, SourceChunk};
use crate::notify::Notifications;
use crate::reveal::Reveal;
use crate::sequence::{Sequencer, Slot, Ticket};

#[derive(Debug)]
pub enum ConsoleEvent {
    Listed {
        ticket: Ticket,
        result: Result<Vec<Document>, ApiError>,
    },
    History {
        ticket: Ticket,
        result: Result<Vec<HistoryEntry>, ApiError>,
    },
    Answered {
        ticket: Ticket,
        document_id: String,
        result: Result<QueryResult, ApiError>,
    },
    Preview {
        ticket: Ticket,
        result: Result<DocumentPreview, ApiError>,
    },
}

pub struct QaConsole {
    api: Arc<dyn DocumentApi>,
    events: UnboundedSender<ConsoleEvent>,
    sequencer: Sequencer,

    pub documents: Vec<Document>,
    pub documents_loading: bool,
    selected: Option<String>,

    pub question: String,
    pub answer: Reveal,
    pub sources: Vec<SourceChunk>,
    expanded: BTreeSet<usize>,
    /// Display order: the backend list reversed
    pub history: Vec<HistoryEntry>,
    pub preview: Option<DocumentPreview>,
    /// Backend processing time of the last answer, in seconds
    pub last_latency: Option<f64>,

    pub loading: bool,
    pub thinking: bool,
}

impl QaConsole {
    pub fn new(
        api: Arc<dyn DocumentApi>,
        events: UnboundedSender<ConsoleEvent>,
        reveal_interval: Duration,
    ) -> Self {
        Self {
            api,
            events,
            sequencer: Sequencer::new(),
            documents: Vec::new(),
            documents_loading: false,
            selected: None,
            question: String::new(),
            answer: Reveal::new(reveal_interval),
            sources: Vec::new(),
            expanded: BTreeSet::new(),
            history: Vec::new(),
            preview: None,
            last_latency: None,
            loading: false,
            thinking: false,
        }
    }

    /// Open the screen, optionally with a document already chosen
    pub fn enter(&mut self, preselect: Option<String>) {
        self.reset_exchange();
        self.history.clear();
        self.question.clear();
        self.selected = None;

        self.load_documents();
        if let Some(id) = preselect {
            self.select(id);
        }
    }

    /// Close the screen. In-flight responses are dropped when they arrive.
    pub fn leave(&mut self) {
        self.sequencer.invalidate(Slot::List);
        self.sequencer.invalidate(Slot::History);
        self.documents_loading = false;
        self.reset_exchange();
    }

    pub fn load_documents(&mut self) {
        self.documents_loading = true;
        let ticket = self.sequencer.issue(Slot::List);
        let api = Arc::clone(&self.api);
        let events = self.events.clone();

        tokio::spawn(async move {
            let result = api.list_documents().await;
            let _ = events.send(ConsoleEvent::Listed { ticket, result });
        });
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_document(&self) -> Option<&Document> {
        let id = self.selected.as_deref()?;
        self.documents.iter().find(|d| d.document_id == id)
    }

    /// Switch to `document_id` and fetch its history.
    ///
    /// Returns false when it was already selected.
    pub fn select(&mut self, document_id: impl Into<String>) -> bool {
        let document_id = document_id.into();
        if self.selected.as_deref() == Some(document_id.as_str()) {
            return false;
        }

        tracing::debug!(%document_id, "document selected");
        self.reset_exchange();
        self.history.clear();
        self.selected = Some(document_id.clone());
        self.fetch_history(document_id);
        true
    }

    pub fn ask(&mut self, notices: &mut Notifications) {
        if self.loading {
            return;
        }
        let Some(document_id) = self.selected.clone() else {
            notices.error("Select a document first!");
            return;
        };
        if self.question.trim().is_empty() {
            notices.error("Enter a question!");
            return;
        }

        self.reset_exchange();
        self.loading = true;
        self.thinking = true;
        let question = std::mem::take(&mut self.question);

        let ticket = self.sequencer.issue(Slot::Query);
        let api = Arc::clone(&self.api);
        let events = self.events.clone();

        tokio::spawn(async move {
            let result = api.query(&document_id, &question).await;
            let _ = events.send(ConsoleEvent::Answered {
                ticket,
                document_id,
                result,
            });
        });
    }

    pub fn load_preview(&mut self, notices: &mut Notifications) {
        let Some(document_id) = self.selected.clone() else {
            notices.error("Select a document first!");
            return;
        };

        let ticket = self.sequencer.issue(Slot::Preview);
        let api = Arc::clone(&self.api);
        let events = self.events.clone();

        tokio::spawn(async move {
            let result = api.preview(&document_id).await;
            let _ = events.send(ConsoleEvent::Preview { ticket, result });
        });
    }

    pub fn close_preview(&mut self) {
        self.sequencer.invalidate(Slot::Preview);
        self.preview = None;
    }

    pub fn toggle_source(&mut self, index: usize) {
        if index >= self.sources.len() {
            return;
        }
        if !self.expanded.remove(&index) {
            self.expanded.insert(index);
        }
    }

    pub fn expand_all(&mut self) {
        self.expanded = (0..self.sources.len()).collect();
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded.contains(&index)
    }

    pub fn tick(&mut self, now: Instant) {
        self.answer.advance(now);
    }

    pub fn apply(&mut self, event: ConsoleEvent, notices: &mut Notifications) {
        match event {
            ConsoleEvent::Listed { ticket, result } => {
                if !self.sequencer.is_current(&ticket) {
                    return;
                }
                self.documents_loading = false;
                match result {
                    Ok(documents) => self.documents = documents,
                    Err(e) => {
                        tracing::warn!(error = %e, "listing documents failed");
                        self.documents.clear();
                        notices.error("Failed to load documents");
                    }
                }
            }
            ConsoleEvent::History { ticket, result } => {
                if !self.sequencer.is_current(&ticket) {
                    tracing::debug!("dropping stale history response");
                    return;
                }
                match result {
                    Ok(mut entries) => {
                        entries.reverse();
                        self.history = entries;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "loading history failed");
                        self.history.clear();
                        notices.error("Failed to load history");
                    }
                }
            }
            ConsoleEvent::Answered {
                ticket,
                document_id,
                result,
            } => {
                if !self.sequencer.is_current(&ticket) {
                    tracing::debug!(%document_id, "dropping stale answer");
                    return;
                }
                self.loading = false;
                self.thinking = false;
                match result {
                    Ok(result) => {
                        tracing::info!(%document_id, sources = result.sources.len(), "answer received");
                        self.answer.start(result.answer_text(), Instant::now());
                        self.last_latency = result.processing_time_seconds;
                        self.sources = result.sources;
                        self.expanded.clear();
                        self.fetch_history(document_id);
                        notices.success("Answer generated!");
                    }
                    Err(e) => {
                        tracing::warn!(%document_id, error = %e, "query failed");
                        notices.error("Failed to get answer");
                    }
                }
            }
            ConsoleEvent::Preview { ticket, result } => {
                if !self.sequencer.is_current(&ticket) {
                    return;
                }
                match result {
                    Ok(preview) => self.preview = Some(preview),
                    Err(e) => {
                        tracing::warn!(error = %e, "loading preview failed");
                        notices.error("Failed to load preview");
                    }
                }
            }
        }
    }

    fn fetch_history(&mut self, document_id: String) {
        let ticket = self.sequencer.issue(Slot::History);
        let api = Arc::clone(&self.api);
        let events = self.events.clone();

        tokio::spawn(async move {
            let result = api.history(&document_id).await;
            let _ = events.send(ConsoleEvent::History { ticket, result });
        });
    }

    /// Forget the current answer and anything still on its way
    fn reset_exchange(&mut self) {
        self.sequencer.invalidate(Slot::Query);
        self.sequencer.invalidate(Slot::Preview);
        self.loading = false;
        self.thinking = false;
        self.answer.cancel();
        self.sources.clear();
        self.expanded.clear();
        self.preview = None;
        self.last_latency = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EMPTY_ANSWER;
    use crate::notify::NoticeLevel;
    use crate::testing::{backend_error, document, entry, Call, FakeApi};
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn console(api: &Arc<FakeApi>) -> (QaConsole, UnboundedReceiver<ConsoleEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let api: Arc<dyn DocumentApi> = Arc::clone(api) as Arc<dyn DocumentApi>;
        (QaConsole::new(api, tx, Duration::from_millis(10)), rx)
    }

    async fn apply_next(
        console: &mut QaConsole,
        rx: &mut UnboundedReceiver<ConsoleEvent>,
        notices: &mut Notifications,
    ) {
        let event = rx.recv().await.unwrap();
        console.apply(event, notices);
    }

    fn far_future() -> Instant {
        Instant::now() + Duration::from_secs(3600)
    }

    #[tokio::test]
    async fn test_enter_with_preselection_loads_list_and_history() {
        let api = Arc::new(FakeApi::new());
        api.push_list(Ok(vec![document("d1", "report.pdf")]));
        api.push_history(Ok(vec![entry("newest", "b"), entry("oldest", "a")]));
        let (mut console, mut rx) = console(&api);
        let mut notices = Notifications::default();

        console.enter(Some("d1".into()));
        apply_next(&mut console, &mut rx, &mut notices).await;
        apply_next(&mut console, &mut rx, &mut notices).await;

        assert_eq!(api.calls(), vec![Call::List, Call::History("d1".into())]);
        assert_eq!(console.selected(), Some("d1"));
        assert_eq!(console.selected_document().unwrap().filename, "report.pdf");
        let questions: Vec<_> = console.history.iter().map(|h| h.question.as_str()).collect();
        assert_eq!(questions, vec!["oldest", "newest"]);
    }

    #[tokio::test]
    async fn test_select_fetches_history_once_and_replaces() {
        let api = Arc::new(FakeApi::new());
        api.push_history(Ok(vec![entry("q-a", "a")]));
        api.push_history(Ok(vec![entry("q-b", "b")]));
        let (mut console, mut rx) = console(&api);
        let mut notices = Notifications::default();

        assert!(console.select("a"));
        apply_next(&mut console, &mut rx, &mut notices).await;
        assert_eq!(console.history, vec![entry("q-a", "a")]);

        assert!(console.select("b"));
        assert!(console.history.is_empty());
        apply_next(&mut console, &mut rx, &mut notices).await;

        assert_eq!(console.history, vec![entry("q-b", "b")]);
        assert_eq!(
            api.calls(),
            vec![Call::History("a".into()), Call::History("b".into())]
        );
    }

    #[tokio::test]
    async fn test_reselecting_same_document_is_noop() {
        let api = Arc::new(FakeApi::new());
        let (mut console, _rx) = console(&api);

        assert!(console.select("a"));
        assert!(!console.select("a"));
        tokio::task::yield_now().await;

        assert_eq!(api.call_count(), 1);
    }

    #[tokio::test]
    async fn test_stale_history_is_dropped() {
        let api = Arc::new(FakeApi::new());
        api.push_history(Ok(vec![entry("from a", "x")]));
        api.push_history(Ok(vec![entry("from b", "y")]));
        let (mut console, mut rx) = console(&api);
        let mut notices = Notifications::default();

        console.select("a");
        console.select("b");
        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        // Deliver out of order
        console.apply(second, &mut notices);
        console.apply(first, &mut notices);

        assert_eq!(console.history, vec![entry("from b", "y")]);
    }

    #[tokio::test]
    async fn test_history_failure_is_reported() {
        let api = Arc::new(FakeApi::new());
        api.push_history(Err(backend_error(500, None)));
        let (mut console, mut rx) = console(&api);
        let mut notices = Notifications::default();

        console.select("a");
        apply_next(&mut console, &mut rx, &mut notices).await;

        assert!(console.history.is_empty());
        assert_eq!(notices.latest().unwrap().message, "Failed to load history");
    }

    #[tokio::test]
    async fn test_ask_requires_selection() {
        let api = Arc::new(FakeApi::new());
        let (mut console, _rx) = console(&api);
        let mut notices = Notifications::default();

        console.question = "What is the summary?".into();
        console.ask(&mut notices);

        assert_eq!(api.call_count(), 0);
        assert!(!console.loading);
        assert_eq!(notices.latest().unwrap().message, "Select a document first!");
    }

    #[tokio::test]
    async fn test_ask_rejects_blank_question() {
        let api = Arc::new(FakeApi::new());
        let (mut console, mut rx) = console(&api);
        let mut notices = Notifications::default();

        console.select("a");
        apply_next(&mut console, &mut rx, &mut notices).await;

        console.question = "   \n\t".into();
        console.ask(&mut notices);

        assert_eq!(api.calls(), vec![Call::History("a".into())]);
        assert!(!console.thinking);
        assert_eq!(notices.latest().unwrap().message, "Enter a question!");
    }

    #[tokio::test]
    async fn test_ask_success_reveals_answer_and_refreshes_history() {
        let api = Arc::new(FakeApi::new());
        api.push_history(Ok(vec![]));
        api.push_query(Ok(QueryResult {
            answer: Some("X".into()),
            sources: vec![SourceChunk { chunk_text: "Y".into() }],
            processing_time_seconds: Some(1.5),
        }));
        api.push_history(Ok(vec![entry("What is the summary?", "X")]));
        let (mut console, mut rx) = console(&api);
        let mut notices = Notifications::default();

        console.select("d1");
        apply_next(&mut console, &mut rx, &mut notices).await;

        console.question = "What is the summary?".into();
        console.ask(&mut notices);
        assert!(console.loading);
        assert!(console.thinking);
        assert!(console.question.is_empty());

        apply_next(&mut console, &mut rx, &mut notices).await;
        assert!(!console.loading);
        assert!(!console.thinking);
        assert_eq!(console.sources.len(), 1);
        assert_eq!(console.last_latency, Some(1.5));
        assert_eq!(notices.latest().unwrap().message, "Answer generated!");

        console.tick(far_future());
        assert_eq!(console.answer.visible(), "X");

        apply_next(&mut console, &mut rx, &mut notices).await;
        assert_eq!(console.history.len(), 1);
        assert_eq!(
            api.calls(),
            vec![
                Call::History("d1".into()),
                Call::Query("d1".into(), "What is the summary?".into()),
                Call::History("d1".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_answer_uses_placeholder() {
        let api = Arc::new(FakeApi::new());
        api.push_query(Ok(QueryResult::default()));
        let (mut console, mut rx) = console(&api);
        let mut notices = Notifications::default();

        console.select("d1");
        apply_next(&mut console, &mut rx, &mut notices).await;
        console.question = "anything?".into();
        console.ask(&mut notices);
        apply_next(&mut console, &mut rx, &mut notices).await;

        console.answer.finish();
        assert_eq!(console.answer.visible(), EMPTY_ANSWER);
        assert!(console.sources.is_empty());
    }

    #[tokio::test]
    async fn test_ask_failure_leaves_answer_empty() {
        let api = Arc::new(FakeApi::new());
        api.push_query(Err(backend_error(500, Some("Query failed: boom"))));
        let (mut console, mut rx) = console(&api);
        let mut notices = Notifications::default();

        console.select("d1");
        apply_next(&mut console, &mut rx, &mut notices).await;
        console.question = "why?".into();
        console.ask(&mut notices);
        apply_next(&mut console, &mut rx, &mut notices).await;

        assert!(!console.loading);
        assert!(!console.thinking);
        assert!(console.answer.is_empty());
        let notice = notices.latest().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "Failed to get answer");
        // No history refresh after a failed query
        assert_eq!(api.call_count(), 2);
    }

    #[tokio::test]
    async fn test_answer_for_previous_document_is_dropped() {
        let api = Arc::new(FakeApi::new());
        api.push_query(Ok(QueryResult {
            answer: Some("about a".into()),
            ..QueryResult::default()
        }));
        let (mut console, mut rx) = console(&api);
        let mut notices = Notifications::default();

        console.select("a");
        apply_next(&mut console, &mut rx, &mut notices).await;
        console.question = "q".into();
        console.ask(&mut notices);
        let answered = rx.recv().await.unwrap();
        assert!(matches!(answered, ConsoleEvent::Answered { .. }));

        console.select("b");
        assert!(!console.loading);
        console.apply(answered, &mut notices);

        console.tick(far_future());
        assert!(console.answer.is_empty());
        assert!(notices.is_empty());
    }

    #[tokio::test]
    async fn test_leave_cancels_reveal() {
        let api = Arc::new(FakeApi::new());
        api.push_query(Ok(QueryResult {
            answer: Some("a long answer".into()),
            ..QueryResult::default()
        }));
        let (mut console, mut rx) = console(&api);
        let mut notices = Notifications::default();

        console.select("a");
        apply_next(&mut console, &mut rx, &mut notices).await;
        console.question = "q".into();
        console.ask(&mut notices);
        apply_next(&mut console, &mut rx, &mut notices).await;
        assert!(console.answer.is_active());

        console.leave();
        console.tick(far_future());
        assert!(!console.answer.is_active());
        assert_eq!(console.answer.visible(), "");
    }

    #[tokio::test]
    async fn test_leave_drops_inflight_responses() {
        let api = Arc::new(FakeApi::new());
        api.push_list(Ok(vec![document("d1", "report.pdf")]));
        api.push_history(Ok(vec![entry("q", "a")]));
        api.push_preview(Ok(DocumentPreview {
            document_id: "d1".into(),
            preview_text: "text".into(),
        }));
        let (mut console, mut rx) = console(&api);
        let mut notices = Notifications::default();

        console.enter(Some("d1".into()));
        console.load_preview(&mut notices);
        console.leave();

        for _ in 0..3 {
            apply_next(&mut console, &mut rx, &mut notices).await;
        }

        assert_eq!(api.call_count(), 3);
        assert!(console.documents.is_empty());
        assert!(console.history.is_empty());
        assert!(console.preview.is_none());
        assert!(!console.documents_loading);
        assert!(notices.is_empty());
    }

    #[tokio::test]
    async fn test_source_expansion() {
        let api = Arc::new(FakeApi::new());
        let (mut console, _rx) = console(&api);
        console.sources = vec![
            SourceChunk { chunk_text: "one".into() },
            SourceChunk { chunk_text: "two".into() },
        ];

        console.toggle_source(1);
        assert!(console.is_expanded(1));
        assert!(!console.is_expanded(0));
        console.toggle_source(1);
        assert!(!console.is_expanded(1));
        console.toggle_source(9);
        assert!(!console.is_expanded(9));

        console.expand_all();
        assert!(console.is_expanded(0) && console.is_expanded(1));
        console.collapse_all();
        assert!(!console.is_expanded(0));
    }

    #[tokio::test]
    async fn test_preview() {
        let api = Arc::new(FakeApi::new());
        api.push_preview(Ok(DocumentPreview {
            document_id: "a".into(),
            preview_text: "Chapter one".into(),
        }));
        let (mut console, mut rx) = console(&api);
        let mut notices = Notifications::default();

        console.load_preview(&mut notices);
        assert_eq!(notices.latest().unwrap().message, "Select a document first!");
        assert_eq!(api.call_count(), 0);

        console.select("a");
        apply_next(&mut console, &mut rx, &mut notices).await;
        console.load_preview(&mut notices);
        apply_next(&mut console, &mut rx, &mut notices).await;

        assert_eq!(console.preview.as_ref().unwrap().preview_text, "Chapter one");
        console.close_preview();
        assert!(console.preview.is_none());
    }
}
