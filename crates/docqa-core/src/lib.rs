pub mod client;
pub mod config;
pub mod console;
pub mod error;
pub mod format;
pub mod manager;
pub mod model;
pub mod notify;
pub mod reveal;
pub mod route;
pub mod sequence;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use client::{BackendClient, DocumentApi, ProgressFn};
pub use config::Config;
pub use console::{ConsoleEvent, QaConsole};
pub use error::ApiError;
pub use format::{format_chunk, FormattedChunk};
pub use manager::{DocumentManager, ManagerEvent};
pub use model::{
    Document, DocumentList, DocumentPreview, HistoryEntry, QueryResult, SourceChunk,
    UploadProgress,
};
pub use notify::{Notice, NoticeLevel, Notifications};
pub use reveal::Reveal;
pub use route::{Route, RouteError};
pub use sequence::{Sequencer, Slot, Ticket};
