//! Paged data source over a local data file.
//!
//! Stands in for the remote listing endpoints: it answers page requests with
//! one page of rows and the total page count, filtering by exact field values
//! on the way.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use polars::prelude::*;
use rayon::prelude::*;
use tracing::{debug, info, instrument, trace};

use crate::column::compare_values;
use crate::domain::LVError;
use crate::list_view::Pagination;
use crate::record::{Record, TableRow};
use crate::reorder::PositionSink;

#[derive(Debug)]
enum FileType {
    CSV,
    PARQUET,
    ARROW,
}

#[derive(Debug)]
pub struct FileInfo {
    path: PathBuf,
    file_size: u64,
    file_type: FileType,
}

struct LoadedColumn {
    name: String,
    data: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    pub pagination: Pagination,
    /// (field, value) pairs a row must all match exactly.
    pub filters: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct PageResult {
    pub rows: Vec<Record>,
    pub page_count: usize,
    pub total: usize,
}

#[derive(Debug, Default)]
pub struct RecordSource {
    name: String,
    headers: Arc<Vec<String>>,
    records: Vec<Record>,
}

impl RecordSource {
    pub fn from_records(name: &str, headers: Arc<Vec<String>>, records: Vec<Record>) -> Self {
        RecordSource {
            name: name.to_string(),
            headers,
            records,
        }
    }

    #[instrument(level = "debug")]
    pub fn load(path: PathBuf) -> Result<Self, LVError> {
        let file_info = Self::get_file_info(path)?;
        let frame = match file_info.file_type {
            FileType::CSV => Self::load_csv(&file_info.path)?,
            FileType::PARQUET => Self::load_parquet(&file_info.path)?,
            FileType::ARROW => Self::load_arrow(&file_info.path)?,
        };

        // Each column is converted in its own thread.
        let start_time = Instant::now();
        let df = frame.collect()?;
        let c_: Result<Vec<LoadedColumn>, _> = df
            .get_column_names()
            .par_iter()
            .map(|name| Self::load_column(&df, name))
            .collect();
        let mut columns = c_?;
        info!(
            "Loading {} ({} bytes) took {}ms ...",
            file_info.path.display(),
            file_info.file_size,
            start_time.elapsed().as_millis()
        );

        let nrows = df.height();
        if !columns.iter().any(|c| c.name == "id") {
            debug!("No id column, numbering rows");
            columns.insert(
                0,
                LoadedColumn {
                    name: "id".to_string(),
                    data: (1..=nrows).map(|i| i.to_string()).collect(),
                },
            );
        }

        let headers = Arc::new(columns.iter().map(|c| c.name.clone()).collect::<Vec<_>>());
        let records = (0..nrows)
            .map(|ridx| {
                let values = columns.iter().map(|c| c.data[ridx].clone()).collect();
                Record::new(Arc::clone(&headers), values)
            })
            .collect();

        let name = file_info
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("???")
            .to_string();
        Ok(Self::from_records(&name, headers, records))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    /// Answer a page request. Ordered data (with a `position` field) is served by position.
    pub fn fetch(&self, query: &Query) -> PageResult {
        let start_time = Instant::now();
        let mut matching: Vec<&Record> = self
            .records
            .par_iter()
            .filter(|r| {
                query
                    .filters
                    .iter()
                    .all(|(field, value)| r.field(field) == Some(value.as_str()))
            })
            .collect();

        if self.headers.iter().any(|h| h == "position") {
            matching.sort_by(|a, b| {
                compare_values(
                    a.field("position").unwrap_or_default(),
                    b.field("position").unwrap_or_default(),
                )
            });
        }

        let total = matching.len();
        let size = query.pagination.page_size.max(1);
        let page_count = total.div_ceil(size).max(1);
        let rows: Vec<Record> = matching
            .into_iter()
            .skip(query.pagination.page_index * size)
            .take(size)
            .cloned()
            .collect();

        trace!(
            "Fetch {} {:?}: {} of {} rows in {}ms",
            self.name,
            query,
            rows.len(),
            total,
            start_time.elapsed().as_millis()
        );
        PageResult {
            rows,
            page_count,
            total,
        }
    }

    fn load_column(df: &DataFrame, col_name: &str) -> Result<LoadedColumn, PolarsError> {
        let col = df.column(col_name)?.cast(&DataType::String)?;
        let series = col.str()?;
        let mut data = Vec::with_capacity(series.len());

        for value in series.into_iter() {
            let ss = match value {
                Some(s) => s.to_string().replace("\r\n", " ↵ ").replace("\n", " ↵ "),
                None => String::from("∅"),
            };
            data.push(ss);
        }

        Ok(LoadedColumn {
            name: col_name.to_string(),
            data,
        })
    }

    fn get_file_info(path: PathBuf) -> Result<FileInfo, LVError> {
        let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => LVError::FileNotFound,
            ErrorKind::PermissionDenied => LVError::PermissionDenied,
            _ => LVError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(LVError::loading_failed(format!("{} is not a file", path.display())));
        }

        let file_size = metadata.len();
        let file_type = Self::detect_file_type(&path)?;

        Ok(FileInfo {
            path,
            file_size,
            file_type,
        })
    }

    fn detect_file_type(path: &Path) -> Result<FileType, LVError> {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_uppercase())
            .as_deref()
        {
            Some("CSV") => Ok(FileType::CSV),
            Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
            Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
            _ => Err(LVError::UnknownFileType),
        }
    }

    fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
        LazyCsvReader::new(PlPath::Local(path.into()))
            .with_has_header(true)
            .finish()
    }

    fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
    }

    fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_ipc(
            PlPath::Local(path.into()),
            polars::io::ipc::IpcScanOptions,
            UnifiedScanArgs::default(),
        )
    }
}

impl PositionSink for RecordSource {
    fn set_position(&mut self, id: &str, position: usize) -> Result<(), LVError> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.row_id() == id)
            .ok_or_else(|| LVError::PersistFailed(format!("{id} not found in {}", self.name)))?;
        if !record.set_field("position", position.to_string()) {
            return Err(LVError::PersistFailed(format!("{} has no positions", self.name)));
        }
        trace!("{}: {id} -> position {position}", self.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::records;

    fn fixture(name: &str) -> PathBuf {
        [env!("CARGO_MANIFEST_DIR"), "tests", "fixtures", name].iter().collect()
    }

    fn source(rows: &[&[&str]]) -> RecordSource {
        let headers = Arc::new(vec!["id".to_string(), "status".to_string(), "position".to_string()]);
        RecordSource::from_records("test", headers, records(&["id", "status", "position"], rows))
    }

    #[test]
    fn fetch_slices_pages() {
        let rows: Vec<Vec<String>> = (1..=25)
            .map(|i| vec![i.to_string(), "draft".to_string(), i.to_string()])
            .collect();
        let refs: Vec<Vec<&str>> = rows.iter().map(|r| r.iter().map(|s| s.as_str()).collect()).collect();
        let slices: Vec<&[&str]> = refs.iter().map(|r| r.as_slice()).collect();
        let src = source(&slices);

        let page = src.fetch(&Query {
            pagination: Pagination::new(2, 10),
            filters: Vec::new(),
        });
        assert_eq!(page.total, 25);
        assert_eq!(page.page_count, 3);
        let ids: Vec<String> = page.rows.iter().map(|r| r.row_id()).collect();
        assert_eq!(ids, vec!["21", "22", "23", "24", "25"]);
    }

    #[test]
    fn fetch_filters_and_orders_by_position() {
        let src = source(&[
            &["a", "draft", "3"],
            &["b", "published", "1"],
            &["c", "draft", "2"],
        ]);
        let page = src.fetch(&Query {
            pagination: Pagination::new(0, 10),
            filters: vec![("status".into(), "draft".into())],
        });
        let ids: Vec<String> = page.rows.iter().map(|r| r.row_id()).collect();
        assert_eq!(ids, vec!["c", "a"]);
        assert_eq!(page.page_count, 1);

        let empty = src.fetch(&Query {
            pagination: Pagination::new(0, 10),
            filters: vec![("status".into(), "archived".into())],
        });
        assert!(empty.rows.is_empty());
        assert_eq!(empty.page_count, 1);
    }

    #[test]
    fn positions_are_written_back() {
        let mut src = source(&[&["a", "draft", "1"], &["b", "draft", "2"]]);
        src.set_position("a", 2).unwrap();
        src.set_position("b", 1).unwrap();
        let page = src.fetch(&Query::default());
        let ids: Vec<String> = page.rows.iter().map(|r| r.row_id()).collect();
        assert_eq!(ids, vec!["b", "a"]);

        assert!(matches!(src.set_position("zz", 1), Err(LVError::PersistFailed(_))));
    }

    #[test]
    fn loads_csv_fixture() {
        let src = RecordSource::load(fixture("courses.csv")).unwrap();
        assert_eq!(src.name(), "courses");
        assert!(src.total() > 10);
        assert_eq!(src.headers()[0], "id");
    }

    #[test]
    fn missing_and_unknown_files() {
        assert!(matches!(
            RecordSource::load(fixture("does_not_exist.csv")),
            Err(LVError::FileNotFound)
        ));
        assert!(matches!(
            RecordSource::load(fixture("README.md")),
            Err(LVError::UnknownFileType)
        ));
    }
}
