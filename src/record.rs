use std::sync::Arc;

pub type RowId = String;

/// Anything the list view can show as a row.
pub trait TableRow {
    fn row_id(&self) -> RowId;
    fn field(&self, name: &str) -> Option<&str>;
}

/// One row of a loaded data file. Headers are shared between all records of a file.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    headers: Arc<Vec<String>>,
    values: Vec<String>,
}

impl Record {
    pub fn new(headers: Arc<Vec<String>>, values: Vec<String>) -> Self {
        Record { headers, values }
    }

    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.headers.iter().position(|h| h == name) {
            Some(idx) => {
                self.values[idx] = value.into();
                true
            }
            None => false,
        }
    }
}

impl TableRow for Record {
    fn row_id(&self) -> RowId {
        self.field("id").unwrap_or_default().to_string()
    }

    fn field(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .position(|h| h == name)
            .and_then(|idx| self.values.get(idx))
            .map(|s| s.as_str())
    }
}

#[cfg(test)]
pub(crate) fn records(headers: &[&str], rows: &[&[&str]]) -> Vec<Record> {
    let headers = Arc::new(headers.iter().map(|h| h.to_string()).collect::<Vec<_>>());
    rows.iter()
        .map(|r| Record::new(Arc::clone(&headers), r.iter().map(|v| v.to_string()).collect()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_lookup_and_update() {
        let mut rows = records(&["id", "title"], &[&["7", "Rust 101"]]);
        let r = &mut rows[0];
        assert_eq!(r.row_id(), "7");
        assert_eq!(r.field("title"), Some("Rust 101"));
        assert_eq!(r.field("missing"), None);

        assert!(r.set_field("title", "Rust 102"));
        assert!(!r.set_field("nope", "x"));
        assert_eq!(r.field("title"), Some("Rust 102"));
    }
}
