//! Spreadsheet loading: schema validation and typed records.
//!
//! The dataset columns a deployment cares about are declared up front in a
//! [`DatasetSchema`] and checked against the header row once at load time,
//! instead of looking cells up by string key row-by-row. Every row becomes a
//! [`Record`] whose non-empty cells are keyed by column name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use calamine::{Data, Reader, Xlsx, open_workbook};
use tracing::info;
use uuid::Uuid;

use crate::error::{Result, SearchError};

/// Declares which spreadsheet columns the service reads.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSchema {
    /// Column providing the record id, or `None` to generate one per row.
    pub id_column: Option<String>,
    /// Columns whose text is embedded and indexed.
    pub indexed_fields: Vec<String>,
}

impl DatasetSchema {
    /// Check that every declared column appears in the header row.
    pub fn validate_header(&self, header: &[String]) -> Result<()> {
        let mut missing: Vec<&str> = Vec::new();
        if let Some(id) = &self.id_column {
            if !header.iter().any(|h| h == id) {
                missing.push(id);
            }
        }
        for field in &self.indexed_fields {
            if !header.iter().any(|h| h == field) {
                missing.push(field);
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SearchError::Dataset(format!(
                "dataset is missing declared column(s): {}",
                missing.join(", ")
            )))
        }
    }
}

/// One spreadsheet row, read once per ingestion run and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Stable identifier: the id column's value (possibly empty, which the
    /// ingestion workflow skips) or a generated UUID.
    pub id: String,
    /// Non-empty cells keyed by column name.
    pub values: BTreeMap<String, String>,
}

impl Record {
    /// The value of a field, if present and non-empty.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// A source of ordered [`Record`]s for the ingestion workflow.
pub trait RecordSource: Send + Sync {
    /// Load the full dataset.
    fn load(&self) -> Result<Vec<Record>>;
}

/// Build records from a header row and cell rows.
///
/// Empty cells are omitted from [`Record::values`]. When the schema has no id
/// column, each record gets a fresh UUIDv4.
pub fn records_from_rows<I>(schema: &DatasetSchema, header: &[String], rows: I) -> Result<Vec<Record>>
where
    I: IntoIterator<Item = Vec<Option<String>>>,
{
    schema.validate_header(header)?;

    let id_index = schema
        .id_column
        .as_ref()
        .and_then(|id| header.iter().position(|h| h == id));

    let records = rows
        .into_iter()
        .map(|cells| {
            let values: BTreeMap<String, String> = header
                .iter()
                .zip(cells.iter())
                .filter_map(|(name, cell)| cell.clone().map(|value| (name.clone(), value)))
                .collect();
            let id = match id_index {
                Some(index) => cells.get(index).cloned().flatten().unwrap_or_default(),
                None => Uuid::new_v4().to_string(),
            };
            Record { id, values }
        })
        .collect();

    Ok(records)
}

/// A [`RecordSource`] reading an xlsx workbook's first sheet.
#[derive(Debug, Clone)]
pub struct XlsxDataset {
    path: PathBuf,
    schema: DatasetSchema,
}

impl XlsxDataset {
    /// Create a dataset over the workbook at `path`.
    pub fn new(path: impl Into<PathBuf>, schema: DatasetSchema) -> Self {
        Self { path: path.into(), schema }
    }
}

impl RecordSource for XlsxDataset {
    fn load(&self) -> Result<Vec<Record>> {
        let records = load_xlsx(&self.path, &self.schema)?;
        info!(path = %self.path.display(), rows = records.len(), "dataset loaded");
        Ok(records)
    }
}

/// Read the first sheet of an xlsx workbook into records.
///
/// The first row is the header; it must contain every column the schema
/// declares.
pub fn load_xlsx(path: &Path, schema: &DatasetSchema) -> Result<Vec<Record>> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| {
        SearchError::Dataset(format!("cannot open '{}': {e}", path.display()))
    })?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SearchError::Dataset(format!("'{}' has no sheets", path.display())))?
        .map_err(|e| SearchError::Dataset(format!("cannot read '{}': {e}", path.display())))?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .ok_or_else(|| SearchError::Dataset(format!("'{}' is empty", path.display())))?
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect();

    let cell_rows = rows.map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>());
    records_from_rows(schema, &header, cell_rows)
}

/// Render a cell as trimmed text; empty and blank cells become `None`.
fn cell_to_string(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        other => {
            let text = other.to_string();
            let text = text.trim();
            if text.is_empty() { None } else { Some(text.to_string()) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(id: Option<&str>, fields: &[&str]) -> DatasetSchema {
        DatasetSchema {
            id_column: id.map(str::to_string),
            indexed_fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn builds_records_with_natural_ids() {
        let rows = vec![
            vec![Some("r1".to_string()), Some("first".to_string())],
            vec![Some("r2".to_string()), Some("second".to_string())],
        ];
        let records =
            records_from_rows(&schema(Some("ID"), &["METADATA"]), &header(&["ID", "METADATA"]), rows)
                .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "r1");
        assert_eq!(records[0].field("METADATA"), Some("first"));
        assert_eq!(records[1].id, "r2");
    }

    #[test]
    fn empty_cells_are_absent_from_values() {
        let rows = vec![vec![Some("r1".to_string()), None]];
        let records =
            records_from_rows(&schema(Some("ID"), &["METADATA"]), &header(&["ID", "METADATA"]), rows)
                .unwrap();
        assert_eq!(records[0].field("METADATA"), None);
    }

    #[test]
    fn missing_id_cell_yields_empty_id() {
        let rows = vec![vec![None, Some("text".to_string())]];
        let records =
            records_from_rows(&schema(Some("ID"), &["METADATA"]), &header(&["ID", "METADATA"]), rows)
                .unwrap();
        assert_eq!(records[0].id, "");
    }

    #[test]
    fn generates_unique_ids_without_id_column() {
        let rows = vec![
            vec![Some("a".to_string())],
            vec![Some("b".to_string())],
        ];
        let records =
            records_from_rows(&schema(None, &["Notes"]), &header(&["Notes"]), rows).unwrap();
        assert!(!records[0].id.is_empty());
        assert_ne!(records[0].id, records[1].id);
    }

    #[test]
    fn rejects_header_missing_declared_column() {
        let err = records_from_rows(
            &schema(Some("ID"), &["METADATA"]),
            &header(&["ID", "Notes"]),
            Vec::<Vec<Option<String>>>::new(),
        )
        .unwrap_err();
        assert!(matches!(err, SearchError::Dataset(_)));
        assert!(err.to_string().contains("METADATA"));
    }
}
