use std::time::{Duration, Instant};

use arboard::Clipboard;
use tracing::{debug, error, info, trace, warn};

use crate::domain::{CMDMode, HELP_TEXT, LVConfig, LVError, Message};
use crate::inputter::{InputResult, Inputter};
use crate::list_view::{ListMessage, ListObserver, ListView, Pagination, SortDirection};
use crate::pages::{PageKind, Router};
use crate::record::{Record, TableRow};
use crate::reorder::reorder;
use crate::source::{Query, RecordSource};
use crate::toolbar::FilterChange;
use crate::visibility::VisibilityStore;

const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(8);

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    LOADING,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Modus {
    TABLE,
    COLUMNS,
    POPUP,
    CMDINPUT,
}

/// Caller side of the current list view: owns the pagination and the filters,
/// and fetches pages from the data source when the list view asks for them.
pub struct PageState {
    kind: PageKind,
    source: RecordSource,
    query: Query,
    pending: Option<Pagination>,
    filters_dirty: bool,
    matching: usize,
}

impl PageState {
    fn new(kind: PageKind, page_size: usize) -> Self {
        PageState {
            kind,
            source: RecordSource::default(),
            query: Query {
                pagination: Pagination::new(0, page_size),
                filters: Vec::new(),
            },
            pending: None,
            filters_dirty: false,
            matching: 0,
        }
    }

    pub fn kind(&self) -> PageKind {
        self.kind
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn total(&self) -> usize {
        self.source.total()
    }

    /// Rows passing the current filters, over all pages.
    pub fn matching(&self) -> usize {
        self.matching
    }
}

impl ListObserver<Record> for PageState {
    fn on_pagination_change(&mut self, pagination: Pagination) {
        self.pending = Some(pagination);
    }

    fn on_selection_change(&mut self, selected: &[&Record]) {
        let ids: Vec<String> = selected.iter().map(|r| r.row_id()).collect();
        debug!("{}: selected {:?}", self.kind.path(), ids);
    }

    fn on_filter_change(&mut self, change: &FilterChange) {
        self.query.filters.retain(|(field, _)| *field != change.field);
        if let Some(value) = &change.value {
            self.query.filters.push((change.field.clone(), value.clone()));
        }
        self.query.pagination.page_index = 0;
        self.filters_dirty = true;
    }
}

pub struct Model {
    config: LVConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    router: Router,
    store: VisibilityStore,
    list: ListView<Record>,
    page: PageState,
    input: Inputter,
    cmd_mode: Option<CMDMode>,
    last_input: InputResult,
    search_before_edit: String,
    status_message: String,
    last_status_message_update: Instant,
    ui_size: (usize, usize),
}

impl Model {
    pub fn init(config: &LVConfig) -> Result<Self, LVError> {
        let router = Router::new(&config.initial_view)?;
        let store = VisibilityStore::new();
        let kind = router.current();
        let mut model = Self {
            config: config.clone(),
            status: Status::READY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            router,
            list: ListView::new(kind.props().include_page_size(config.page_size), &store),
            store,
            page: PageState::new(kind, config.page_size),
            input: Inputter::default(),
            cmd_mode: None,
            last_input: InputResult::default(),
            search_before_edit: String::new(),
            status_message: "Started lv!".to_string(),
            last_status_message_update: Instant::now(),
            ui_size: (0, 0),
        };
        model.mount(kind);
        Ok(model)
    }

    /// Mount a fresh list view for `kind`. Column toggles come back from the store.
    fn mount(&mut self, kind: PageKind) {
        info!("Mount {}", kind.path());
        self.list = ListView::new(kind.props().include_page_size(self.config.page_size), &self.store);
        self.list.set_loading(true);
        self.page = PageState::new(kind, self.config.page_size);
        self.status = Status::LOADING;
        self.set_status_message(format!("Loading {} ...", kind.title()));
    }

    /// Load the data of the mounted page and bind its first page.
    pub fn load_current_page(&mut self) {
        let kind = self.page.kind;
        let path = self.config.data_dir.join(kind.file());
        let start_time = Instant::now();
        match RecordSource::load(path) {
            Ok(source) => {
                debug!("{} columns: {:?}", source.name(), source.headers());
                self.page.source = source;
                self.refetch();
                self.set_status_message(format!(
                    "Loaded {} {} in {}ms",
                    self.page.total(),
                    kind.title().to_lowercase(),
                    start_time.elapsed().as_millis()
                ));
            }
            Err(e) => {
                match &e {
                    LVError::LoadingFailed(reason, span_trace) => {
                        error!("Loading {} failed: {reason}\n{span_trace}", kind.path())
                    }
                    other => error!("Loading {} failed: {other:?}", kind.path()),
                }
                self.list.set_loading(false);
                self.set_status_message(format!("Something went wrong loading {}: {e}", kind.title()));
            }
        }
        self.status = Status::READY;
    }

    fn refetch(&mut self) {
        let result = self.page.source.fetch(&self.page.query);
        let pagination = self.page.query.pagination;
        self.page.matching = result.total;
        self.list
            .bind(result.rows, pagination, result.page_count, &self.store, &mut self.page);
    }

    /// The page data is loaded by the next `load_current_page`, after a loading frame was drawn.
    fn navigate(&mut self, kind: Option<PageKind>) {
        if let Some(kind) = kind {
            self.mount(kind);
        }
    }

    fn list_update(&mut self, message: ListMessage) {
        self.list.update(message, &mut self.store, &mut self.page);

        if let Some(pagination) = self.page.pending.take() {
            self.page.query.pagination = pagination;
            self.refetch();
        }
        if std::mem::take(&mut self.page.filters_dirty) {
            self.refetch();
        }
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), LVError> {
        let Some(msg) = message else {
            return Ok(());
        };
        match self.modus {
            Modus::TABLE => match msg {
                Message::Quit => self.quit(),
                Message::MoveUp => self.list_update(ListMessage::MoveUp),
                Message::MoveDown => self.list_update(ListMessage::MoveDown),
                Message::MoveLeft => self.list_update(ListMessage::MoveLeft),
                Message::MoveRight => self.list_update(ListMessage::MoveRight),
                Message::NextPage => self.list_update(ListMessage::NextPage),
                Message::PrevPage => self.list_update(ListMessage::PrevPage),
                Message::FirstPage => self.list_update(ListMessage::FirstPage),
                Message::LastPage => self.list_update(ListMessage::LastPage),
                Message::CyclePageSize => self.list_update(ListMessage::CyclePageSize),
                Message::ToggleSelect => self.list_update(ListMessage::ToggleRow),
                Message::ToggleSelectAll => self.list_update(ListMessage::ToggleAllRows),
                Message::SortAscending => self.list_update(ListMessage::Sort(SortDirection::Ascending)),
                Message::SortDescending => self.list_update(ListMessage::Sort(SortDirection::Descending)),
                Message::ClearSort => self.list_update(ListMessage::ClearSort),
                Message::Search => self.enter_cmd_mode(CMDMode::Search),
                Message::CycleSearchField => self.list_update(ListMessage::CycleSearchField),
                Message::CycleFilter(idx) => self.list_update(ListMessage::CycleFilter(idx)),
                Message::ResetFilters => self.list_update(ListMessage::ResetFilters),
                Message::ColumnMenu => self.switch_modus(Modus::COLUMNS),
                Message::ResetColumns => self.reset_columns(),
                Message::NextView => {
                    let kind = self.router.next();
                    self.navigate(Some(kind));
                }
                Message::PrevView => {
                    let kind = self.router.prev();
                    self.navigate(Some(kind));
                }
                Message::GotoView(idx) => {
                    let kind = self.router.goto(idx);
                    self.navigate(kind);
                }
                Message::MoveItemUp => self.move_item(-1),
                Message::MoveItemDown => self.move_item(1),
                Message::SelectAction(key) => self.select_action(key),
                Message::Help => self.switch_modus(Modus::POPUP),
                Message::Exit => {
                    if !self.list.search_term().is_empty() {
                        self.list_update(ListMessage::Search(String::new()));
                    }
                }
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
            Modus::COLUMNS => match msg {
                Message::Quit => self.quit(),
                Message::MoveUp => self.list_update(ListMessage::MenuUp),
                Message::MoveDown => self.list_update(ListMessage::MenuDown),
                Message::ToggleSelect | Message::Enter => self.list_update(ListMessage::ToggleMenuColumn),
                Message::ResetColumns => self.reset_columns(),
                Message::ColumnMenu | Message::Exit => self.exit(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
            Modus::POPUP => match msg {
                Message::Quit => self.quit(),
                Message::Help | Message::Exit | Message::Enter => self.exit(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
            Modus::CMDINPUT => {
                if let Message::RawKey(key) = msg {
                    self.raw_input(key)
                }
            }
        }
        Ok(())
    }

    // -------------------- Control handling functions ---------------------- //

    fn switch_modus(&mut self, modus: Modus) {
        self.previous_modus = self.modus;
        self.modus = modus;
    }

    fn exit(&mut self) {
        trace!("Leaving {:?}", self.modus);
        self.previous_modus = self.modus;
        self.modus = Modus::TABLE;
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    fn reset_columns(&mut self) {
        self.list.reset_columns(&mut self.store);
        if self.store.is_empty() {
            debug!("No column toggles left");
        } else {
            debug!("{} view(s) keep column toggles", self.store.len());
        }
        self.set_status_message("Columns reset to defaults");
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.ui_size.0, width, self.ui_size.1, height
        );
        self.ui_size = (width, height);
    }

    fn enter_cmd_mode(&mut self, mode: CMDMode) {
        if !self.list.search().is_enabled() {
            self.set_status_message("No search on this view");
            return;
        }
        trace!("Entering command mode ...");
        self.switch_modus(Modus::CMDINPUT);
        self.cmd_mode = Some(mode);
        self.search_before_edit = self.list.search_term().to_string();
        self.input.set(&self.search_before_edit);
        self.last_input = self.input.get();
    }

    fn raw_input(&mut self, key: ratatui::crossterm::event::KeyEvent) {
        self.last_input = self.input.read(key);
        if self.last_input.canceled {
            let previous = self.search_before_edit.clone();
            self.list_update(ListMessage::Search(previous));
        } else {
            // Search as you type.
            let term = self.last_input.input.clone();
            self.list_update(ListMessage::Search(term));
        }
        if self.last_input.finished {
            debug!("Search {:?} done", self.list.search_term());
            self.cmd_mode = None;
            self.modus = self.previous_modus;
            self.previous_modus = Modus::CMDINPUT;
        }
    }

    fn select_action(&mut self, key: char) {
        if self.list.selection_count() == 0 || !self.list.select_actions().iter().any(|a| a.key == key) {
            return;
        }
        match key {
            'c' => match self.copy_selection() {
                Ok(n) => self.set_status_message(format!("Copied {n} row(s) to clipboard.")),
                Err(e) => {
                    warn!("Error copying to clipboard: {e:?}");
                    self.set_status_message(format!("Copy failed: {e}"));
                }
            },
            'u' => self.list_update(ListMessage::ClearSelection),
            _ => debug!("No handler for action {key}"),
        }
    }

    fn copy_selection(&mut self) -> Result<usize, LVError> {
        let text = selection_as_csv(&self.list);
        Clipboard::new()?.set_text(text)?;
        Ok(self.list.selection_count())
    }

    fn move_item(&mut self, step: isize) {
        if !self.page.kind.is_reorderable() {
            return;
        }
        if self.list.sorting().is_some() || !self.list.search_term().is_empty() {
            self.set_status_message("Clear sort and search before moving items");
            return;
        }
        let Some(from) = self.list.table_state().selected() else {
            return;
        };
        let Some(to) = from.checked_add_signed(step) else {
            return;
        };
        let positions: Option<Vec<usize>> = self
            .list
            .rows()
            .iter()
            .map(|r| r.field("position").and_then(|p| p.trim().parse().ok()))
            .collect();
        let Some(positions) = positions else {
            self.set_status_message("Some items have no position, cannot move");
            return;
        };

        match reorder(self.list.rows_mut(), from, to, &positions, &mut self.page.source) {
            Ok(true) => {
                self.list.table_state_mut().select(Some(to));
                self.refetch();
                self.set_status_message(format!("Moved item to position {}", positions[to]));
            }
            Ok(false) => {}
            Err(e) => self.set_status_message(format!("Moving failed, order restored: {e}")),
        }
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
    }

    // -------------------- Accessors for rendering ---------------------- //

    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::CMDINPUT
    }

    pub fn modus(&self) -> Modus {
        self.modus
    }

    pub fn list(&self) -> &ListView<Record> {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut ListView<Record> {
        &mut self.list
    }

    pub fn page(&self) -> &PageState {
        &self.page
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn cmdinput(&self) -> Option<&InputResult> {
        match self.cmd_mode {
            Some(CMDMode::Search) => Some(&self.last_input),
            None => None,
        }
    }

    /// The last status message, until it gets stale.
    pub fn status_message(&self) -> &str {
        if self.last_status_message_update.elapsed() > STATUS_MESSAGE_TTL {
            return "";
        }
        &self.status_message
    }

    pub fn help_text(&self) -> &'static str {
        HELP_TEXT
    }
}

fn wrap_cell_content(c: &str) -> String {
    let needs_escaping = c.chars().any(|c| c == '"');
    let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
    let mut out = String::from(c);

    if needs_escaping {
        out = out.replace('"', "\"\"");
    }
    if needs_wrapping || needs_escaping {
        out = format!("\"{out}\"");
    }
    out
}

/// Selected rows as CSV over the visible columns, with a header line.
pub fn selection_as_csv(list: &ListView<Record>) -> String {
    let columns = list.visible_columns();
    let mut lines = vec![
        columns
            .iter()
            .map(|c| wrap_cell_content(c.header()))
            .collect::<Vec<_>>()
            .join(","),
    ];
    for row in list.selected_rows() {
        lines.push(
            columns
                .iter()
                .map(|c| wrap_cell_content(&c.value(row)))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    lines.join("\n")
}
