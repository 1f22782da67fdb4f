//! Column visibility: the per-view session store of manual toggles and the rule
//! merging those toggles with the defaults computed from the current rows.

use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use crate::column::{ColumnDef, ColumnId};
use crate::record::TableRow;

/// Identity of a list view, the navigation path it is shown under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewId(String);

impl ViewId {
    pub fn new(path: impl Into<String>) -> Self {
        ViewId(path.into())
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Effective visibility of every column of a view.
pub type VisibilityState = HashMap<ColumnId, bool>;

/// Manual column toggles, kept for the lifetime of the application session.
///
/// Owned by the application and handed to each list view, so the toggles of a
/// view survive remounting it when the user navigates away and back.
#[derive(Debug, Default)]
pub struct VisibilityStore {
    views: HashMap<ViewId, HashMap<ColumnId, bool>>,
}

impl VisibilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, view: &ViewId, column: &str) -> Option<bool> {
        self.views.get(view).and_then(|prefs| prefs.get(column).copied())
    }

    pub fn set(&mut self, view: &ViewId, column: &str, visible: bool) {
        trace!("Store visibility {view}:{column} = {visible}");
        self.views
            .entry(view.clone())
            .or_default()
            .insert(column.to_string(), visible);
    }

    /// Forget every toggle of `view`, its columns fall back to their defaults.
    pub fn clear_view(&mut self, view: &ViewId) {
        self.views.remove(view);
    }

    /// Number of views holding at least one toggle.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

/// Stored toggles win for every column present in the store. Every other column
/// gets its default computed from `rows`. Stored keys of columns the view no
/// longer has are ignored.
pub fn merge_visibility<R: TableRow>(
    view: &ViewId,
    columns: &[ColumnDef<R>],
    rows: &[R],
    store: &VisibilityStore,
) -> VisibilityState {
    columns
        .iter()
        .map(|c| {
            let visible = if !c.is_hideable() {
                true
            } else {
                store
                    .get(view, c.id())
                    .unwrap_or_else(|| c.default_visible(rows))
            };
            (c.id().to_string(), visible)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Visibility;
    use crate::record::{Record, records};

    fn columns() -> Vec<ColumnDef<Record>> {
        vec![
            ColumnDef::field("id", "Id").with_hideable(false),
            ColumnDef::field("title", "Title"),
            ColumnDef::field("due", "Due").with_visibility(Visibility::WhenAnyValue),
        ]
    }

    #[test]
    fn computed_default_fills_gaps() {
        let view = ViewId::new("/admin/assignments");
        let store = VisibilityStore::new();
        let rows = records(&["id", "title", "due"], &[&["1", "Essay", ""]]);

        let state = merge_visibility(&view, &columns(), &rows, &store);
        assert!(state["id"]);
        assert!(state["title"]);
        assert!(!state["due"]);
    }

    #[test]
    fn stored_preference_wins() {
        let view = ViewId::new("/admin/assignments");
        let mut store = VisibilityStore::new();
        store.set(&view, "due", true);
        store.set(&view, "title", false);
        let rows = records(&["id", "title", "due"], &[&["1", "Essay", ""]]);

        let state = merge_visibility(&view, &columns(), &rows, &store);
        assert!(state["due"]);
        assert!(!state["title"]);
    }

    #[test]
    fn pinned_column_ignores_store() {
        let view = ViewId::new("/admin/assignments");
        let mut store = VisibilityStore::new();
        store.set(&view, "id", false);

        let state = merge_visibility(&view, &columns(), &[], &store);
        assert!(state["id"]);
    }

    #[test]
    fn views_are_independent() {
        let courses = ViewId::new("/admin/courses");
        let quizzes = ViewId::new("/admin/quizzes");
        let mut store = VisibilityStore::new();
        store.set(&courses, "title", false);

        assert_eq!(store.get(&courses, "title"), Some(false));
        assert_eq!(store.get(&quizzes, "title"), None);
        assert_eq!(store.len(), 1);

        store.clear_view(&courses);
        assert!(store.is_empty());
    }
}
