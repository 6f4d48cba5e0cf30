use std::sync::Arc;
use std::time::Instant;

use docqa_core::{
    Config, ConsoleEvent, DocumentApi, DocumentManager, ManagerEvent, Notifications, QaConsole,
    Route,
};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Documents,
    Ask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Panes of the question screen, in Tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Documents,
    Question,
    Sources,
    History,
}

impl FocusPane {
    pub fn next(self) -> Self {
        match self {
            FocusPane::Documents => FocusPane::Question,
            FocusPane::Question => FocusPane::Sources,
            FocusPane::Sources => FocusPane::History,
            FocusPane::History => FocusPane::Documents,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FocusPane::Documents => FocusPane::History,
            FocusPane::Question => FocusPane::Documents,
            FocusPane::Sources => FocusPane::Question,
            FocusPane::History => FocusPane::Sources,
        }
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,
    pub focus: FocusPane,
    pub backend_url: String,

    // Screens
    pub manager: DocumentManager,
    pub console: QaConsole,
    pub notices: Notifications,

    // Documents screen
    pub documents_state: ListState,
    pub path_input: String,
    pub path_cursor: usize,

    // Question screen
    pub picker_state: ListState,
    pub sources_state: ListState,
    pub question_cursor: usize,
    pub answer_scroll: u16,
    pub history_scroll: u16,
    pub preview_scroll: u16,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub list_area: Option<Rect>,
    pub answer_area: Option<Rect>,
    pub sources_area: Option<Rect>,
    pub history_area: Option<Rect>,
}

impl App {
    pub fn new(
        api: Arc<dyn DocumentApi>,
        manager_events: UnboundedSender<ManagerEvent>,
        console_events: UnboundedSender<ConsoleEvent>,
        config: &Config,
    ) -> Self {
        Self {
            should_quit: false,
            screen: Screen::Documents,
            input_mode: InputMode::Normal,
            focus: FocusPane::Documents,
            backend_url: config.normalized_backend_url(),

            manager: DocumentManager::new(Arc::clone(&api), manager_events),
            console: QaConsole::new(api, console_events, config.reveal_interval()),
            notices: Notifications::new(config.notice_ttl()),

            documents_state: ListState::default(),
            path_input: String::new(),
            path_cursor: 0,

            picker_state: ListState::default(),
            sources_state: ListState::default(),
            question_cursor: 0,
            answer_scroll: 0,
            history_scroll: 0,
            preview_scroll: 0,

            animation_frame: 0,

            list_area: None,
            answer_area: None,
            sources_area: None,
            history_area: None,
        }
    }

    /// Switch screens. Each screen reloads its data when it is entered.
    pub fn navigate(&mut self, route: Route) {
        tracing::debug!(route = %route.to_path(), "navigate");
        self.input_mode = InputMode::Normal;

        match route {
            Route::Documents => {
                if self.screen == Screen::Ask {
                    self.console.leave();
                }
                self.screen = Screen::Documents;
                self.manager.load();
            }
            Route::Ask { doc } => {
                self.focus = if doc.is_some() {
                    FocusPane::Question
                } else {
                    FocusPane::Documents
                };
                self.screen = Screen::Ask;
                self.picker_state = ListState::default();
                self.sources_state = ListState::default();
                self.question_cursor = 0;
                self.answer_scroll = 0;
                self.history_scroll = 0;
                self.console.enter(doc);
            }
        }
    }

    pub fn apply_manager(&mut self, event: ManagerEvent) {
        self.manager.apply(event, &mut self.notices);
        clamp_selection(&mut self.documents_state, self.manager.documents.len());
    }

    pub fn apply_console(&mut self, event: ConsoleEvent) {
        let answered = matches!(event, ConsoleEvent::Answered { .. });
        self.console.apply(event, &mut self.notices);

        // Keep the picker on the selected document once the list arrives
        if let Some(id) = self.console.selected() {
            if let Some(i) = self.console.documents.iter().position(|d| d.document_id == id) {
                self.picker_state.select(Some(i));
            }
        }
        clamp_selection(&mut self.picker_state, self.console.documents.len());

        if answered {
            self.answer_scroll = 0;
            self.sources_state = ListState::default();
            if !self.console.sources.is_empty() {
                self.sources_state.select(Some(0));
            }
        }
    }

    /// Tick animation frame, reveal and notification expiry (called by Tick event)
    pub fn tick(&mut self, now: Instant) {
        if self.console.thinking || self.manager.uploading || self.manager.loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        self.console.tick(now);
        self.notices.prune(now);
    }

    // Documents screen
    pub fn highlighted_document_id(&self) -> Option<String> {
        self.documents_state
            .selected()
            .and_then(|i| self.manager.documents.get(i))
            .map(|d| d.document_id.clone())
    }

    pub fn documents_nav_down(&mut self) {
        list_down(&mut self.documents_state, self.manager.documents.len());
    }

    pub fn documents_nav_up(&mut self) {
        list_up(&mut self.documents_state);
    }

    /// Use the typed path as the upload candidate
    pub fn commit_path_input(&mut self) {
        if !self.manager.drop_text(&self.path_input) {
            self.manager.clear_selection();
        }
    }

    /// Dropped file: select it and mirror it in the path field
    pub fn drop_file(&mut self, text: &str) {
        if self.manager.drop_text(text) {
            if let Some(path) = self.manager.selected_file() {
                self.path_input = path.display().to_string();
                self.path_cursor = self.path_input.chars().count();
            }
        }
    }

    // Question screen
    pub fn picker_nav_down(&mut self) {
        list_down(&mut self.picker_state, self.console.documents.len());
    }

    pub fn picker_nav_up(&mut self) {
        list_up(&mut self.picker_state);
    }

    pub fn select_picked_document(&mut self) {
        let picked = self
            .picker_state
            .selected()
            .and_then(|i| self.console.documents.get(i))
            .map(|d| d.document_id.clone());

        if let Some(id) = picked {
            if self.console.select(id) {
                self.history_scroll = 0;
                self.answer_scroll = 0;
                self.sources_state = ListState::default();
            }
            self.focus = FocusPane::Question;
        }
    }

    pub fn sources_nav_down(&mut self) {
        list_down(&mut self.sources_state, self.console.sources.len());
    }

    pub fn sources_nav_up(&mut self) {
        list_up(&mut self.sources_state);
    }

    pub fn toggle_highlighted_source(&mut self) {
        if let Some(i) = self.sources_state.selected() {
            self.console.toggle_source(i);
        }
    }

    pub fn ask(&mut self) {
        self.console.ask(&mut self.notices);
        if self.console.loading {
            self.question_cursor = 0;
            self.answer_scroll = 0;
            self.input_mode = InputMode::Normal;
        }
    }
}

fn list_down(state: &mut ListState, len: usize) {
    if len == 0 {
        state.select(None);
        return;
    }
    let next = match state.selected() {
        Some(i) => (i + 1).min(len - 1),
        None => 0,
    };
    state.select(Some(next));
}

fn list_up(state: &mut ListState) {
    let i = state.selected().unwrap_or(0);
    state.select(Some(i.saturating_sub(1)));
}

fn clamp_selection(state: &mut ListState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        None => state.select(Some(0)),
        Some(i) if i >= len => state.select(Some(len - 1)),
        Some(_) => {}
    }
}
