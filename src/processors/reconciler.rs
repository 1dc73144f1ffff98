// photo-prep/src/processors/reconciler.rs
use crate::core::{Result, ValidationRecord};
use crate::processors::extractor::Table;
use std::collections::HashMap;
use std::path::Path;

pub const MEASUREMENT_COLUMNS: [&str; 4] = ["file_size_kb", "width", "height", "ratio"];

fn measurement_cells(record: &ValidationRecord) -> [String; 4] {
    [
        record.file_size_kb.to_string(),
        record.width.to_string(),
        record.height.to_string(),
        record.ratio.map(|r| r.to_string()).unwrap_or_default(),
    ]
}

/// Joins validation measurements onto source rows and persists the result.
pub struct Reconciler {
    left_key: String,
    right_key: String,
}

impl Reconciler {
    /// `left_key` names the source column holding photo names; `right_key`
    /// is the header given to `target_name` in the report.
    pub fn new(left_key: impl Into<String>, right_key: impl Into<String>) -> Self {
        Self {
            left_key: left_key.into(),
            right_key: right_key.into(),
        }
    }

    /// Without an original table the report is the measurements alone.
    /// With one, every original row is kept in order and gains the
    /// measurements of the record whose name equals its key cell (blank
    /// when there is none); records matching no row are dropped.
    pub fn reconcile(&self, records: &[ValidationRecord], original: Option<&Table>) -> Result<Table> {
        let Some(original) = original else {
            return Ok(self.measurements_table(records));
        };

        let key_col = original.column_index(&self.left_key)?;
        let mut by_name: HashMap<&str, &ValidationRecord> = HashMap::new();
        for record in records {
            by_name.entry(record.target_name.as_str()).or_insert(record);
        }

        let include_right_key = self.right_key != self.left_key;
        let mut headers = original.headers.clone();
        if include_right_key {
            headers.push(self.right_key.clone());
        }
        headers.extend(MEASUREMENT_COLUMNS.iter().map(|c| c.to_string()));

        let mut matched = 0;
        let rows = original
            .rows
            .iter()
            .enumerate()
            .map(|(index, source)| {
                let mut row = source.clone();
                row.resize(original.headers.len(), String::new());

                let hit = original.cell(index, key_col).and_then(|key| by_name.get(key));
                match hit {
                    Some(record) => {
                        matched += 1;
                        if include_right_key {
                            row.push(record.target_name.clone());
                        }
                        row.extend(measurement_cells(record));
                    }
                    None => {
                        let blanks = MEASUREMENT_COLUMNS.len() + usize::from(include_right_key);
                        row.extend(std::iter::repeat(String::new()).take(blanks));
                    }
                }
                row
            })
            .collect();

        log::info!(
            "Matched {} of {} rows against {} measurements",
            matched,
            original.rows.len(),
            records.len()
        );
        Ok(Table::new(headers, rows))
    }

    pub fn write_report(&self, report: &Table, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        report.write_csv(path)?;
        log::info!("Validation results saved to {}", path.display());
        Ok(())
    }

    fn measurements_table(&self, records: &[ValidationRecord]) -> Table {
        let mut headers = vec![self.right_key.clone()];
        headers.extend(MEASUREMENT_COLUMNS.iter().map(|c| c.to_string()));

        let rows = records
            .iter()
            .map(|record| {
                let mut row = vec![record.target_name.clone()];
                row.extend(measurement_cells(record));
                row
            })
            .collect();

        Table::new(headers, rows)
    }
}
