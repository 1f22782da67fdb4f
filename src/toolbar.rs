use std::fmt::Debug;

use crate::record::TableRow;

/// What kind of value a labeled search option expects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchInput {
    Text,
    Number,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOption {
    pub label: String,
    pub value: String,
    pub input: SearchInput,
}

impl SearchOption {
    pub fn new(label: &str, value: &str, input: SearchInput) -> Self {
        SearchOption {
            label: label.to_string(),
            value: value.to_string(),
            input,
        }
    }
}

/// Search box configuration of a list view.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Search {
    #[default]
    None,
    Field(String),
    /// A row matches if any of the fields matches.
    Fields(Vec<String>),
    /// The user picks which option to search in.
    Labeled(Vec<SearchOption>),
}

impl Search {
    pub fn is_enabled(&self) -> bool {
        match self {
            Search::None => false,
            Search::Field(_) => true,
            Search::Fields(fields) => !fields.is_empty(),
            Search::Labeled(options) => !options.is_empty(),
        }
    }

    /// Placeholder shown in the search box.
    pub fn placeholder(&self, option_idx: usize) -> String {
        match self {
            Search::None => String::new(),
            Search::Field(field) => format!("Search {field}..."),
            Search::Fields(fields) => format!("Search {}...", fields.join(", ")),
            Search::Labeled(options) => options
                .get(option_idx)
                .map(|o| format!("Search {}...", o.label))
                .unwrap_or_default(),
        }
    }

    pub fn option_count(&self) -> usize {
        match self {
            Search::Labeled(options) => options.len(),
            _ => 1,
        }
    }

    pub fn matches<R: TableRow>(&self, row: &R, term: &str, option_idx: usize) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return true;
        }
        let needle = term.to_lowercase();
        let contains = |field: &str| {
            row.field(field)
                .is_some_and(|v| v.to_lowercase().contains(&needle))
        };
        match self {
            Search::None => true,
            Search::Field(field) => contains(field.as_str()),
            Search::Fields(fields) => fields.iter().any(|f| contains(f.as_str())),
            Search::Labeled(options) => match options.get(option_idx) {
                Some(option) if option.input == SearchInput::Number => {
                    match (term.parse::<f64>(), row.field(&option.value).map(str::parse::<f64>)) {
                        (Ok(wanted), Some(Ok(value))) => wanted == value,
                        _ => false,
                    }
                }
                Some(option) => contains(option.value.as_str()),
                None => true,
            },
        }
    }
}

/// Reported to the list view's observer when a toolbar filter changes.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterChange {
    pub field: String,
    pub value: Option<String>,
}

/// A filter widget mounted into the toolbar.
///
/// Filters only hold the user's choice. Applying it is up to the caller, which
/// learns about changes through `ListObserver::on_filter_change`.
pub trait ToolbarFilter: Debug {
    fn label(&self) -> &str;
    /// Row field the filter applies to.
    fn field(&self) -> &str;
    fn selected(&self) -> Option<&str>;
    /// Advance to the next choice.
    fn cycle(&mut self);
    fn reset(&mut self);

    fn display(&self) -> String {
        format!("{}: {}", self.label(), self.selected().unwrap_or("All"))
    }
}

/// Filter choosing one of a fixed set of values, or all of them.
#[derive(Debug, Clone)]
pub struct SelectFilter {
    label: String,
    field: String,
    options: Vec<String>,
    selected: Option<usize>,
}

impl SelectFilter {
    pub fn new(label: &str, field: &str, options: &[&str]) -> Self {
        SelectFilter {
            label: label.to_string(),
            field: field.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            selected: None,
        }
    }
}

impl ToolbarFilter for SelectFilter {
    fn label(&self) -> &str {
        &self.label
    }

    fn field(&self) -> &str {
        &self.field
    }

    fn selected(&self) -> Option<&str> {
        self.selected
            .and_then(|idx| self.options.get(idx))
            .map(|s| s.as_str())
    }

    fn cycle(&mut self) {
        self.selected = match self.selected {
            None if !self.options.is_empty() => Some(0),
            Some(idx) if idx + 1 < self.options.len() => Some(idx + 1),
            _ => None,
        };
    }

    fn reset(&mut self) {
        self.selected = None;
    }
}

/// Action offered in the toolbar while rows are selected.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectAction {
    pub key: char,
    pub label: String,
}

impl SelectAction {
    pub fn new(key: char, label: &str) -> Self {
        SelectAction {
            key,
            label: label.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::records;

    #[test]
    fn search_single_and_multiple_fields() {
        let rows = records(
            &["id", "title", "instructor"],
            &[&["1", "Rust Basics", "Ada"], &["2", "Go", "Rustam"]],
        );

        let single = Search::Field("title".into());
        assert!(single.matches(&rows[0], "rust", 0));
        assert!(!single.matches(&rows[1], "rust", 0));

        let multi = Search::Fields(vec!["title".into(), "instructor".into()]);
        assert!(multi.matches(&rows[0], "RUST", 0));
        assert!(multi.matches(&rows[1], "rust", 0));
        assert!(multi.matches(&rows[1], "  ", 0));
    }

    #[test]
    fn labeled_search_uses_chosen_option() {
        let rows = records(&["id", "title", "score"], &[&["1", "Quiz 1", "10"]]);
        let search = Search::Labeled(vec![
            SearchOption::new("Title", "title", SearchInput::Text),
            SearchOption::new("Score", "score", SearchInput::Number),
        ]);

        assert!(search.matches(&rows[0], "quiz", 0));
        assert!(!search.matches(&rows[0], "quiz", 1));
        assert!(search.matches(&rows[0], "10.0", 1));
        assert!(!search.matches(&rows[0], "1", 1));
        assert_eq!(search.placeholder(1), "Search Score...");
    }

    #[test]
    fn select_filter_cycles_through_all() {
        let mut filter = SelectFilter::new("Status", "status", &["draft", "published"]);
        assert_eq!(filter.selected(), None);
        filter.cycle();
        assert_eq!(filter.selected(), Some("draft"));
        filter.cycle();
        assert_eq!(filter.display(), "Status: published");
        filter.cycle();
        assert_eq!(filter.selected(), None);
        filter.cycle();
        filter.reset();
        assert_eq!(filter.display(), "Status: All");
    }
}
