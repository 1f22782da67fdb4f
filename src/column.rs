use std::cmp::Ordering;

use derive_setters::Setters;

use crate::record::TableRow;

pub type ColumnId = String;

/// Where a column takes its cell text from.
#[derive(Debug)]
pub enum Accessor<R> {
    Field(String),
    Computed(fn(&R) -> String),
}

/// Default visibility rule of a column, evaluated against the rows of the current page.
/// A manual toggle stored for the view always takes precedence.
#[derive(Debug)]
pub enum Visibility<R> {
    Always,
    Never,
    /// Shown iff at least one row has a non-empty value in this column.
    WhenAnyValue,
    PredicateOnRows(fn(&[R]) -> bool),
}

#[derive(Debug, Setters)]
#[setters(prefix = "with_")]
pub struct ColumnDef<R> {
    #[setters(skip)]
    id: ColumnId,
    #[setters(into)]
    header: String,
    #[setters(skip)]
    accessor: Accessor<R>,
    visibility: Visibility<R>,
    sortable: bool,
    hideable: bool,
    #[setters(strip_option)]
    width: Option<u16>,
}

impl<R: TableRow> ColumnDef<R> {
    /// Column showing the row field of the same name.
    pub fn field(id: &str, header: &str) -> Self {
        Self::new(id, header, Accessor::Field(id.to_string()))
    }

    /// Synthetic column with a computed cell text.
    pub fn computed(id: &str, header: &str, compute: fn(&R) -> String) -> Self {
        Self::new(id, header, Accessor::Computed(compute))
    }

    fn new(id: &str, header: &str, accessor: Accessor<R>) -> Self {
        ColumnDef {
            id: id.to_string(),
            header: header.to_string(),
            accessor,
            visibility: Visibility::Always,
            sortable: true,
            hideable: true,
            width: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable
    }

    pub fn is_hideable(&self) -> bool {
        self.hideable
    }

    pub fn width(&self) -> Option<u16> {
        self.width
    }

    pub fn value(&self, row: &R) -> String {
        match &self.accessor {
            Accessor::Field(name) => row.field(name).unwrap_or_default().to_string(),
            Accessor::Computed(compute) => compute(row),
        }
    }

    /// Visibility of this column when nobody toggled it.
    pub fn default_visible(&self, rows: &[R]) -> bool {
        if !self.hideable {
            return true;
        }
        match &self.visibility {
            Visibility::Always => true,
            Visibility::Never => false,
            Visibility::WhenAnyValue => rows.iter().any(|r| !is_blank(&self.value(r))),
            Visibility::PredicateOnRows(predicate) => predicate(rows),
        }
    }
}

/// Loaded files mark missing values with `∅`.
pub fn is_blank(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || v == "∅"
}

/// Numbers compare numerically and sort before text; text compares as strings.
pub fn compare_values(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(a_float), Ok(b_float)) => a_float.partial_cmp(&b_float).unwrap_or(Ordering::Equal),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Record, records};

    fn has_due_date(rows: &[Record]) -> bool {
        rows.iter().any(|r| r.field("due").is_some_and(|d| !is_blank(d)))
    }

    #[test]
    fn default_visibility_rules() {
        let rows = records(&["id", "due"], &[&["1", "∅"], &["2", ""]]);

        let always = ColumnDef::<Record>::field("id", "Id");
        assert!(always.default_visible(&rows));

        let never = ColumnDef::<Record>::field("id", "Id").with_visibility(Visibility::Never);
        assert!(!never.default_visible(&rows));

        let any = ColumnDef::<Record>::field("due", "Due").with_visibility(Visibility::WhenAnyValue);
        assert!(!any.default_visible(&rows));

        let pred = ColumnDef::<Record>::field("due", "Due")
            .with_visibility(Visibility::PredicateOnRows(has_due_date));
        assert!(!pred.default_visible(&rows));

        let filled = records(&["id", "due"], &[&["1", "2024-05-01"]]);
        assert!(any.default_visible(&filled));
        assert!(pred.default_visible(&filled));
    }

    #[test]
    fn pinned_column_ignores_rule() {
        let col = ColumnDef::<Record>::field("id", "Id")
            .with_visibility(Visibility::Never)
            .with_hideable(false);
        assert!(col.default_visible(&[]));
    }

    #[test]
    fn computed_accessor() {
        let rows = records(&["id", "first", "last"], &[&["1", "Ada", "Lovelace"]]);
        let col = ColumnDef::<Record>::computed("name", "Name", |r| {
            format!("{} {}", r.field("first").unwrap_or(""), r.field("last").unwrap_or(""))
        });
        assert_eq!(col.value(&rows[0]), "Ada Lovelace");
    }

    #[test]
    fn numbers_sort_before_text() {
        assert_eq!(compare_values("2", "10"), Ordering::Less);
        assert_eq!(compare_values("10", "abc"), Ordering::Less);
        assert_eq!(compare_values("b", "a"), Ordering::Greater);
    }
}
