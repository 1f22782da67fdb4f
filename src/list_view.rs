//! Generic list view over one page of rows.
//!
//! The list view never fetches. The caller binds a page of rows together with
//! the pagination it was fetched for and the total page count, and reacts to
//! the requests the list view sends to its [`ListObserver`]. Locally it owns
//! column visibility (backed by the session [`VisibilityStore`]), the row
//! selection, the client side sort and the search box filter.

use std::collections::BTreeSet;

use derive_setters::Setters;
use ratatui::widgets::TableState;
use tracing::{debug, trace};

use crate::column::{ColumnDef, ColumnId, compare_values};
use crate::record::{RowId, TableRow};
use crate::toolbar::{FilterChange, Search, SelectAction, ToolbarFilter};
use crate::visibility::{ViewId, VisibilityState, VisibilityStore, merge_visibility};

pub const DEFAULT_PAGE_SIZES: [usize; 3] = [10, 20, 50];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page_index: usize,
    pub page_size: usize,
}

impl Pagination {
    pub fn new(page_index: usize, page_size: usize) -> Self {
        Pagination {
            page_index,
            page_size,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::new(0, DEFAULT_PAGE_SIZES[0])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Receives the requests and notifications of a list view.
pub trait ListObserver<R> {
    /// The user asked for another page or page size. The list view keeps showing
    /// the bound pagination until the caller binds the new page.
    fn on_pagination_change(&mut self, pagination: Pagination);

    fn on_selection_change(&mut self, _selected: &[&R]) {}

    fn on_filter_change(&mut self, _change: &FilterChange) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListMessage {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    CyclePageSize,
    ToggleRow,
    ToggleAllRows,
    ClearSelection,
    Sort(SortDirection),
    ClearSort,
    Search(String),
    CycleSearchField,
    CycleFilter(usize),
    ResetFilters,
    MenuUp,
    MenuDown,
    ToggleMenuColumn,
}

/// Static configuration of a list view.
#[derive(Debug, Setters)]
#[setters(prefix = "with_")]
pub struct ListViewProps<R> {
    #[setters(skip)]
    pub view: ViewId,
    #[setters(skip)]
    pub columns: Vec<ColumnDef<R>>,
    pub page_sizes: Vec<usize>,
    pub search: Search,
    pub custom_filters: Vec<Box<dyn ToolbarFilter>>,
    pub select_actions: Vec<SelectAction>,
}

impl<R> ListViewProps<R> {
    pub fn new(view: ViewId, columns: Vec<ColumnDef<R>>) -> Self {
        ListViewProps {
            view,
            columns,
            page_sizes: DEFAULT_PAGE_SIZES.to_vec(),
            search: Search::None,
            custom_filters: Vec::new(),
            select_actions: Vec::new(),
        }
    }

    /// Make sure the pager offers `size`, keeping the sizes ascending.
    pub fn include_page_size(mut self, size: usize) -> Self {
        if let Err(idx) = self.page_sizes.binary_search(&size) {
            self.page_sizes.insert(idx, size);
        }
        self
    }
}

pub struct ListView<R> {
    props: ListViewProps<R>,
    rows: Vec<R>,
    pagination: Pagination,
    page_count: usize,
    is_loading: bool,
    visibility: VisibilityState,
    selection: BTreeSet<RowId>,
    sorting: Option<(ColumnId, SortDirection)>,
    search_term: String,
    search_option: usize,
    table_state: TableState,
    cursor_column: usize,
    menu_cursor: usize,
}

impl<R: TableRow> ListView<R> {
    /// Mount a list view. Visibility starts from the store and the empty row set.
    pub fn new(props: ListViewProps<R>, store: &VisibilityStore) -> Self {
        let page_size = props.page_sizes.first().copied().unwrap_or(DEFAULT_PAGE_SIZES[0]);
        let mut list = ListView {
            props,
            rows: Vec::new(),
            pagination: Pagination::new(0, page_size),
            page_count: 0,
            is_loading: false,
            visibility: VisibilityState::new(),
            selection: BTreeSet::new(),
            sorting: None,
            search_term: String::new(),
            search_option: 0,
            table_state: TableState::default(),
            cursor_column: 0,
            menu_cursor: 0,
        };
        list.sync_visibility(store);
        debug!("Mounted list view {}", list.props.view);
        list
    }

    /// Bind a freshly fetched page of rows.
    pub fn bind(
        &mut self,
        rows: Vec<R>,
        pagination: Pagination,
        page_count: usize,
        store: &VisibilityStore,
        observer: &mut impl ListObserver<R>,
    ) {
        trace!(
            "Bind {} rows to {} (page {}/{}, size {})",
            rows.len(),
            self.props.view,
            pagination.page_index + 1,
            page_count,
            pagination.page_size
        );
        self.rows = rows;
        self.pagination = pagination;
        self.page_count = page_count;
        self.is_loading = false;
        self.sync_visibility(store);

        let before = self.selection.len();
        let ids: BTreeSet<RowId> = self.rows.iter().map(|r| r.row_id()).collect();
        self.selection.retain(|id| ids.contains(id));
        if self.selection.len() != before {
            self.notify_selection(observer);
        }
        self.clamp_cursor();
    }

    /// Recompute the effective column visibility. Returns whether it changed.
    pub fn sync_visibility(&mut self, store: &VisibilityStore) -> bool {
        let merged = merge_visibility(&self.props.view, &self.props.columns, &self.rows, store);
        if merged == self.visibility {
            return false;
        }
        trace!("Visibility of {} changed: {:?}", self.props.view, merged);
        self.visibility = merged;
        self.clamp_cursor_column();
        true
    }

    pub fn set_column_visible(&mut self, id: &str, visible: bool, store: &mut VisibilityStore) {
        let Some(column) = self.props.columns.iter().find(|c| c.id() == id) else {
            return;
        };
        if !column.is_hideable() {
            return;
        }
        store.set(&self.props.view, id, visible);
        self.visibility.insert(id.to_string(), visible);
        self.clamp_cursor_column();
    }

    pub fn toggle_column(&mut self, id: &str, store: &mut VisibilityStore) {
        let visible = self.is_column_visible(id);
        self.set_column_visible(id, !visible, store);
    }

    /// Drop the stored toggles of this view.
    pub fn reset_columns(&mut self, store: &mut VisibilityStore) {
        debug!("Reset columns of {}", self.props.view);
        store.clear_view(&self.props.view);
        self.sync_visibility(store);
    }

    pub fn set_loading(&mut self, is_loading: bool) {
        self.is_loading = is_loading;
    }

    pub fn update(
        &mut self,
        message: ListMessage,
        store: &mut VisibilityStore,
        observer: &mut impl ListObserver<R>,
    ) {
        trace!("{}: {:?}", self.props.view, message);
        match message {
            ListMessage::MoveUp => {
                let row = self.table_state.selected().unwrap_or(0);
                self.table_state.select(Some(row.saturating_sub(1)));
                self.clamp_cursor();
            }
            ListMessage::MoveDown => {
                let row = self.table_state.selected().map(|r| r + 1).unwrap_or(0);
                self.table_state.select(Some(row));
                self.clamp_cursor();
            }
            ListMessage::MoveLeft => self.cursor_column = self.cursor_column.saturating_sub(1),
            ListMessage::MoveRight => {
                let n = self.visible_columns().len();
                if self.cursor_column + 1 < n {
                    self.cursor_column += 1;
                }
            }
            ListMessage::NextPage => {
                if self.pagination.page_index + 1 < self.page_count {
                    self.request_page(self.pagination.page_index + 1, observer);
                }
            }
            ListMessage::PrevPage => {
                if self.pagination.page_index > 0 {
                    self.request_page(self.pagination.page_index - 1, observer);
                }
            }
            ListMessage::FirstPage => {
                if self.pagination.page_index != 0 {
                    self.request_page(0, observer);
                }
            }
            ListMessage::LastPage => {
                let last = self.page_count.saturating_sub(1);
                if self.page_count > 0 && self.pagination.page_index != last {
                    self.request_page(last, observer);
                }
            }
            ListMessage::CyclePageSize => self.cycle_page_size(observer),
            ListMessage::ToggleRow => self.toggle_cursor_row(observer),
            ListMessage::ToggleAllRows => self.toggle_all_rows(observer),
            ListMessage::ClearSelection => {
                if !self.selection.is_empty() {
                    self.selection.clear();
                    self.notify_selection(observer);
                }
            }
            ListMessage::Sort(direction) => {
                let target = self
                    .visible_columns()
                    .get(self.cursor_column)
                    .filter(|c| c.is_sortable())
                    .map(|c| c.id().to_string());
                if let Some(id) = target {
                    self.sorting = Some((id, direction));
                }
            }
            ListMessage::ClearSort => self.sorting = None,
            ListMessage::Search(term) => {
                self.search_term = term;
                self.table_state.select(Some(0));
                self.clamp_cursor();
            }
            ListMessage::CycleSearchField => {
                self.search_option = (self.search_option + 1) % self.props.search.option_count().max(1);
            }
            ListMessage::CycleFilter(idx) => {
                if let Some(filter) = self.props.custom_filters.get_mut(idx) {
                    filter.cycle();
                    let change = FilterChange {
                        field: filter.field().to_string(),
                        value: filter.selected().map(|s| s.to_string()),
                    };
                    debug!("Filter {} changed to {:?}", filter.label(), change.value);
                    observer.on_filter_change(&change);
                }
            }
            ListMessage::ResetFilters => {
                for filter in self.props.custom_filters.iter_mut() {
                    if filter.selected().is_some() {
                        filter.reset();
                        observer.on_filter_change(&FilterChange {
                            field: filter.field().to_string(),
                            value: None,
                        });
                    }
                }
            }
            ListMessage::MenuUp => self.menu_cursor = self.menu_cursor.saturating_sub(1),
            ListMessage::MenuDown => {
                if self.menu_cursor + 1 < self.props.columns.len() {
                    self.menu_cursor += 1;
                }
            }
            ListMessage::ToggleMenuColumn => {
                if let Some(id) = self.props.columns.get(self.menu_cursor).map(|c| c.id().to_string()) {
                    self.toggle_column(&id, store);
                }
            }
        }
    }

    fn request_page(&self, page_index: usize, observer: &mut impl ListObserver<R>) {
        let pagination = Pagination::new(page_index, self.pagination.page_size);
        debug!("{} requests page {:?}", self.props.view, pagination);
        observer.on_pagination_change(pagination);
    }

    fn cycle_page_size(&self, observer: &mut impl ListObserver<R>) {
        let sizes = &self.props.page_sizes;
        if sizes.is_empty() {
            return;
        }
        let next = sizes
            .iter()
            .position(|&s| s == self.pagination.page_size)
            .map(|idx| sizes[(idx + 1) % sizes.len()])
            .unwrap_or(sizes[0]);
        if next != self.pagination.page_size {
            observer.on_pagination_change(Pagination::new(0, next));
        }
    }

    fn toggle_cursor_row(&mut self, observer: &mut impl ListObserver<R>) {
        let id = self
            .table_state
            .selected()
            .and_then(|idx| self.display_rows().get(idx).map(|r| r.row_id()));
        if let Some(id) = id {
            if !self.selection.remove(&id) {
                self.selection.insert(id);
            }
            self.notify_selection(observer);
        }
    }

    fn toggle_all_rows(&mut self, observer: &mut impl ListObserver<R>) {
        let ids: Vec<RowId> = self.display_rows().iter().map(|r| r.row_id()).collect();
        if ids.is_empty() {
            return;
        }
        if ids.iter().all(|id| self.selection.contains(id)) {
            for id in &ids {
                self.selection.remove(id);
            }
        } else {
            self.selection.extend(ids);
        }
        self.notify_selection(observer);
    }

    fn notify_selection(&self, observer: &mut impl ListObserver<R>) {
        let selected = self.selected_rows();
        debug!("{}: {} row(s) selected", self.props.view, selected.len());
        observer.on_selection_change(&selected);
    }

    fn clamp_cursor_column(&mut self) {
        let n = self.visible_columns().len();
        self.cursor_column = self.cursor_column.min(n.saturating_sub(1));
    }

    fn clamp_cursor(&mut self) {
        let n = self.display_rows().len();
        if n == 0 {
            self.table_state.select(None);
        } else {
            let row = self.table_state.selected().unwrap_or(0).min(n - 1);
            self.table_state.select(Some(row));
        }
    }

    /// Rows of the bound page after the search filter and the sort, in display order.
    pub fn display_rows(&self) -> Vec<&R> {
        let mut rows: Vec<&R> = self
            .rows
            .iter()
            .filter(|r| self.props.search.matches(*r, &self.search_term, self.search_option))
            .collect();

        if let Some((id, direction)) = &self.sorting
            && let Some(column) = self.props.columns.iter().find(|c| c.id() == id)
        {
            rows.sort_by(|a, b| {
                let ord = compare_values(&column.value(a), &column.value(b));
                match direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }
        rows
    }

    /// Selected rows of the bound page, in page order.
    pub fn selected_rows(&self) -> Vec<&R> {
        self.rows
            .iter()
            .filter(|r| self.selection.contains(&r.row_id()))
            .collect()
    }

    pub fn is_selected(&self, row: &R) -> bool {
        self.selection.contains(&row.row_id())
    }

    pub fn visible_columns(&self) -> Vec<&ColumnDef<R>> {
        self.props
            .columns
            .iter()
            .filter(|c| self.is_column_visible(c.id()))
            .collect()
    }

    pub fn is_column_visible(&self, id: &str) -> bool {
        self.visibility.get(id).copied().unwrap_or(true)
    }

    /// Replace the bound rows in place, e.g. after an optimistic reorder.
    pub fn rows_mut(&mut self) -> &mut Vec<R> {
        &mut self.rows
    }
}

impl<R> ListView<R> {
    pub fn view(&self) -> &ViewId {
        &self.props.view
    }

    pub fn columns(&self) -> &[ColumnDef<R>] {
        &self.props.columns
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn page_sizes(&self) -> &[usize] {
        &self.props.page_sizes
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn search(&self) -> &Search {
        &self.props.search
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn search_option(&self) -> usize {
        self.search_option
    }

    pub fn custom_filters(&self) -> &[Box<dyn ToolbarFilter>] {
        &self.props.custom_filters
    }

    pub fn select_actions(&self) -> &[SelectAction] {
        &self.props.select_actions
    }

    pub fn selection_count(&self) -> usize {
        self.selection.len()
    }

    pub fn sorting(&self) -> Option<&(ColumnId, SortDirection)> {
        self.sorting.as_ref()
    }

    pub fn cursor_column(&self) -> usize {
        self.cursor_column
    }

    pub fn menu_cursor(&self) -> usize {
        self.menu_cursor
    }

    /// Imperative access to the underlying table state.
    pub fn table_state(&self) -> &TableState {
        &self.table_state
    }

    pub fn table_state_mut(&mut self) -> &mut TableState {
        &mut self.table_state
    }
}
