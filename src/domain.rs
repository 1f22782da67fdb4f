use std::fmt;
use std::io::Error;

use arboard::Error as ClipboardError;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;
use tracing_error::SpanTrace;

#[derive(Debug)]
pub enum LVError {
    IoError(Error),
    PolarsError(PolarsError),
    ClipboardError(ClipboardError),
    LoadingFailed(String, SpanTrace),
    PersistFailed(String),
    UnknownView(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
}

impl LVError {
    pub fn loading_failed(reason: impl Into<String>) -> Self {
        LVError::LoadingFailed(reason.into(), SpanTrace::capture())
    }
}

impl fmt::Display for LVError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LVError::IoError(e) => write!(f, "io error: {e}"),
            LVError::PolarsError(e) => write!(f, "data error: {e}"),
            LVError::ClipboardError(e) => write!(f, "clipboard error: {e}"),
            LVError::LoadingFailed(reason, _) => write!(f, "loading failed: {reason}"),
            LVError::PersistFailed(reason) => write!(f, "saving failed: {reason}"),
            LVError::UnknownView(path) => write!(f, "unknown view {path}"),
            LVError::FileNotFound => write!(f, "file not found"),
            LVError::PermissionDenied => write!(f, "permission denied"),
            LVError::UnknownFileType => write!(f, "unknown file type"),
        }
    }
}

impl std::error::Error for LVError {}

impl From<Error> for LVError {
    fn from(err: Error) -> Self {
        LVError::IoError(err)
    }
}

impl From<PolarsError> for LVError {
    fn from(err: PolarsError) -> Self {
        LVError::PolarsError(err)
    }
}

impl From<ClipboardError> for LVError {
    fn from(err: ClipboardError) -> Self {
        LVError::ClipboardError(err)
    }
}

#[derive(Debug, Clone)]
pub struct LVConfig {
    pub event_poll_time: u64,
    pub max_column_width: usize,
    pub data_dir: std::path::PathBuf,
    pub initial_view: String,
    pub page_size: usize,
}

impl Default for LVConfig {
    fn default() -> Self {
        LVConfig {
            event_poll_time: 100,
            max_column_width: 32,
            data_dir: "tests/fixtures".into(),
            initial_view: "/admin/courses".to_string(),
            page_size: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CMDMode {
    Search,
}

#[derive(Debug, Clone)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    CyclePageSize,
    ToggleSelect,
    ToggleSelectAll,
    SortAscending,
    SortDescending,
    ClearSort,
    Search,
    CycleSearchField,
    CycleFilter(usize),
    ColumnMenu,
    ResetColumns,
    ResetFilters,
    NextView,
    PrevView,
    GotoView(usize),
    MoveItemUp,
    MoveItemDown,
    SelectAction(char),
    Help,
    Enter,
    Exit,
    Resize(usize, usize),
    RawKey(KeyEvent),
}

pub const HELP_TEXT: &str = "\
 q          quit
 Tab / S-Tab  next / previous view
 1..5       jump to view
 j/k ↑/↓    move row
 h/l ←/→    move column
 n/p        next / previous page
 g / G      first / last page
 z          cycle page size
 space      select row
 a          select all rows on page
 s / S      sort ascending / descending
 x          clear sort
 /          search
 f          cycle search field
 F1..F4     cycle filter
 R          reset filters
 v          column menu (space toggles)
 V          reset columns
 K / J      move item up / down
 c          copy selected rows
 u          clear selection
 ?          this help
 Esc        close";
