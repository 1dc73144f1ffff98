// photo-prep/src/processors/extractor.rs
use crate::core::{ColumnNames, PhotoToolError, ProfileRecord, Result};
use calamine::{open_workbook_auto, Reader};
use std::collections::HashSet;
use std::path::{Component, Path};

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Header row plus data rows, all cells kept as text. Rows may be shorter
/// than the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Loads a table by extension: CSV, or a spreadsheet workbook. `sheet`
    /// picks the worksheet and defaults to the first one; CSV ignores it.
    pub fn from_path(path: &Path, sheet: Option<&str>) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if extension == "csv" {
            if let Some(sheet) = sheet {
                log::warn!("Ignoring sheet {} for CSV input {}", sheet, path.display());
            }
            Self::from_csv_path(path)
        } else if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
            Self::from_workbook_path(path, sheet)
        } else {
            Err(PhotoToolError::InvalidParameter(format!(
                "Unsupported table format: {}",
                path.display()
            )))
        }
    }

    pub fn from_workbook_path(path: &Path, sheet: Option<&str>) -> Result<Self> {
        let mut workbook = open_workbook_auto(path)?;
        let sheet = match sheet {
            Some(name) => name.to_string(),
            None => workbook.sheet_names().first().cloned().ok_or_else(|| {
                PhotoToolError::InvalidParameter(format!("No sheets in {}", path.display()))
            })?,
        };

        let range = workbook.worksheet_range(&sheet)?;
        let mut rows = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>());

        let headers = rows
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();
        let rows: Vec<Vec<String>> = rows.collect();

        log::info!(
            "Loaded {} rows from sheet {} of {}",
            rows.len(),
            sheet,
            path.display()
        );
        Ok(Self { headers, rows })
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)?;

        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(|c| c.to_string()).collect());
        }

        log::info!("Loaded {} rows from {}", rows.len(), path.display());
        Ok(Self { headers, rows })
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| PhotoToolError::MissingColumn(name.to_string()))
    }

    /// Non-blank cell at (`row`, `column`).
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingCell(String),
    /// Not usable as a single file name (separators, `..`, `.`).
    InvalidName(String),
    DuplicateName(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSkip {
    pub row: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Default)]
pub struct Extraction {
    pub records: Vec<ProfileRecord>,
    pub skipped: Vec<RowSkip>,
}

pub struct RecordExtractor {
    columns: ColumnNames,
}

impl RecordExtractor {
    pub fn new(columns: ColumnNames) -> Self {
        Self { columns }
    }

    /// Builds one record per usable row, in row order. Fails only when a
    /// configured column is absent from the header.
    pub fn extract(&self, table: &Table) -> Result<Extraction> {
        let id_col = table.column_index(&self.columns.id)?;
        let url_col = table.column_index(&self.columns.url)?;
        let name_col = table.column_index(&self.columns.photo_name)?;

        let mut extraction = Extraction::default();
        let mut names = HashSet::new();

        for row in 0..table.rows.len() {
            let cells = [
                (id_col, &self.columns.id),
                (url_col, &self.columns.url),
                (name_col, &self.columns.photo_name),
            ]
            .map(|(col, name)| table.cell(row, col).ok_or(name));

            let [id, url, photo_name] = match cells {
                [Ok(id), Ok(url), Ok(photo_name)] => [id, url, photo_name],
                _ => {
                    let missing = cells
                        .iter()
                        .find_map(|c| c.err())
                        .cloned()
                        .unwrap_or_default();
                    log::warn!("Skipping row {}: missing {}", row, missing);
                    extraction.skipped.push(RowSkip {
                        row,
                        reason: SkipReason::MissingCell(missing),
                    });
                    continue;
                }
            };

            if !is_plain_file_name(photo_name) {
                log::warn!("Skipping row {}: unusable photo name {:?}", row, photo_name);
                extraction.skipped.push(RowSkip {
                    row,
                    reason: SkipReason::InvalidName(photo_name.to_string()),
                });
                continue;
            }

            if !names.insert(photo_name.to_string()) {
                log::warn!("Skipping row {}: duplicate photo name {}", row, photo_name);
                extraction.skipped.push(RowSkip {
                    row,
                    reason: SkipReason::DuplicateName(photo_name.to_string()),
                });
                continue;
            }

            extraction.records.push(ProfileRecord {
                identifier: id.to_string(),
                source_url: url.to_string(),
                target_name: photo_name.to_string(),
            });
        }

        log::info!(
            "Extracted {} records ({} rows skipped)",
            extraction.records.len(),
            extraction.skipped.len()
        );
        Ok(extraction)
    }
}

/// True when `name` is exactly one normal path component.
pub fn is_plain_file_name(name: &str) -> bool {
    if name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn sample_table() -> Table {
        Table::new(
            strings(&["Confirmation_Number", "Name", "Image_URL", "Photo_Name"]),
            vec![
                strings(&["1", "Ann", "http://x/a.jpg", "p1"]),
                strings(&["2", "Bob", "", "p2"]),
                strings(&["3", "Cy", "http://x/c.jpg"]),
                strings(&["4", "Di", "http://x/d.jpg", "p1"]),
                strings(&["5", "Ed", "http://x/e.jpg", "p5"]),
            ],
        )
    }

    #[test]
    fn keeps_row_order_and_skips_bad_rows() {
        let extraction = RecordExtractor::new(ColumnNames::default())
            .extract(&sample_table())
            .unwrap();

        let names: Vec<&str> = extraction
            .records
            .iter()
            .map(|r| r.target_name.as_str())
            .collect();
        assert_eq!(names, vec!["p1", "p5"]);
        assert_eq!(extraction.records[1].identifier, "5");
        assert_eq!(extraction.records[1].source_url, "http://x/e.jpg");

        assert_eq!(
            extraction.skipped,
            vec![
                RowSkip { row: 1, reason: SkipReason::MissingCell("Image_URL".into()) },
                RowSkip { row: 2, reason: SkipReason::MissingCell("Photo_Name".into()) },
                RowSkip { row: 3, reason: SkipReason::DuplicateName("p1".into()) },
            ]
        );
    }

    #[test]
    fn unknown_column_is_an_error() {
        let columns = ColumnNames {
            url: "Photo_Link".to_string(),
            ..Default::default()
        };
        let result = RecordExtractor::new(columns).extract(&sample_table());
        assert!(matches!(result, Err(PhotoToolError::MissingColumn(c)) if c == "Photo_Link"));
    }

    #[test]
    fn reads_ragged_csv() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("input.csv");
        std::fs::write(
            &path,
            "Confirmation_Number,Image_URL,Photo_Name\n1,http://x/a.jpg,p1\n2,http://x/b.jpg\n",
        )
        .unwrap();

        let table = Table::from_csv_path(&path).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.cell(1, 2), None);

        let extraction = RecordExtractor::new(ColumnNames::default()).extract(&table).unwrap();
        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.skipped.len(), 1);
    }

    #[test]
    fn names_that_leave_the_directory_are_skipped() {
        let table = Table::new(
            strings(&["Confirmation_Number", "Image_URL", "Photo_Name"]),
            vec![
                strings(&["1", "http://x/a.jpg", "../escaped"]),
                strings(&["2", "http://x/b.jpg", "a/../../x"]),
                strings(&["3", "http://x/c.jpg", ".."]),
                strings(&["4", "http://x/d.jpg", "nested\\name"]),
                strings(&["5", "http://x/e.jpg", "Jane Doe.v2"]),
            ],
        );

        let extraction = RecordExtractor::new(ColumnNames::default()).extract(&table).unwrap();
        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.records[0].target_name, "Jane Doe.v2");

        let invalid: Vec<usize> = extraction
            .skipped
            .iter()
            .filter(|s| matches!(s.reason, SkipReason::InvalidName(_)))
            .map(|s| s.row)
            .collect();
        assert_eq!(invalid, vec![0, 1, 2, 3]);
    }

    #[test]
    fn plain_file_names() {
        assert!(is_plain_file_name("p1"));
        assert!(is_plain_file_name("..hidden"));
        assert!(!is_plain_file_name("."));
        assert!(!is_plain_file_name("dir/"));
        assert!(!is_plain_file_name("/abs"));
    }

    /// Stored (uncompressed) zip archive.
    fn zip_stored(entries: &[(&str, String)]) -> Vec<u8> {
        fn crc32(data: &[u8]) -> u32 {
            let mut crc = 0xFFFF_FFFFu32;
            for byte in data {
                crc ^= *byte as u32;
                for _ in 0..8 {
                    crc = if crc & 1 == 1 { (crc >> 1) ^ 0xEDB8_8320 } else { crc >> 1 };
                }
            }
            !crc
        }

        // 2024-01-01
        let (time, date) = (0u16, (44u16 << 9) | (1 << 5) | 1);
        let mut out = Vec::new();
        let mut central = Vec::new();

        for (name, body) in entries {
            let (name, body) = (name.as_bytes(), body.as_bytes());
            let crc = crc32(body);
            let offset = out.len() as u32;

            out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
            for v in [20u16, 0, 0, time, date] {
                out.extend_from_slice(&v.to_le_bytes());
            }
            for v in [crc, body.len() as u32, body.len() as u32] {
                out.extend_from_slice(&v.to_le_bytes());
            }
            out.extend_from_slice(&(name.len() as u16).to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(name);
            out.extend_from_slice(body);

            central.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
            for v in [20u16, 20, 0, 0, time, date] {
                central.extend_from_slice(&v.to_le_bytes());
            }
            for v in [crc, body.len() as u32, body.len() as u32] {
                central.extend_from_slice(&v.to_le_bytes());
            }
            for v in [name.len() as u16, 0, 0, 0, 0] {
                central.extend_from_slice(&v.to_le_bytes());
            }
            central.extend_from_slice(&0u32.to_le_bytes());
            central.extend_from_slice(&offset.to_le_bytes());
            central.extend_from_slice(name);
        }

        let central_offset = out.len() as u32;
        out.extend_from_slice(&central);
        out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
        for v in [0u16, 0, entries.len() as u16, entries.len() as u16] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out.extend_from_slice(&(central.len() as u32).to_le_bytes());
        out.extend_from_slice(&central_offset.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out
    }

    fn sheet_xml(rows: &[&[&str]]) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
        );
        for (r, row) in rows.iter().enumerate() {
            xml.push_str(&format!(r#"<row r="{}">"#, r + 1));
            for (c, value) in row.iter().enumerate() {
                let cell = format!("{}{}", (b'A' + c as u8) as char, r + 1);
                if value.parse::<f64>().is_ok() {
                    xml.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, cell, value));
                } else {
                    xml.push_str(&format!(
                        r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                        cell, value
                    ));
                }
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData></worksheet>");
        xml
    }

    fn write_workbook(path: &Path) {
        let content_types = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/worksheets/sheet2.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;
        let root_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;
        let workbook = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/><sheet name="Profiles" sheetId="2" r:id="rId2"/></sheets></workbook>"#;
        let workbook_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/></Relationships>"#;

        let archive = zip_stored(&[
            ("[Content_Types].xml", content_types.to_string()),
            ("_rels/.rels", root_rels.to_string()),
            ("xl/workbook.xml", workbook.to_string()),
            ("xl/_rels/workbook.xml.rels", workbook_rels.to_string()),
            ("xl/worksheets/sheet1.xml", sheet_xml(&[&["Notes"], &["nothing here"]])),
            (
                "xl/worksheets/sheet2.xml",
                sheet_xml(&[
                    &["Confirmation_Number", "Image_URL", "Photo_Name"],
                    &["101", "http://x/a.jpg", "p1"],
                    &["102", "http://x/b.jpg", "p2"],
                ]),
            ),
        ]);
        std::fs::write(path, archive).unwrap();
    }

    #[test]
    fn reads_named_sheet_from_workbook() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.xlsx");
        write_workbook(&path);

        let table = Table::from_path(&path, Some("Profiles")).unwrap();
        assert_eq!(table.headers, strings(&["Confirmation_Number", "Image_URL", "Photo_Name"]));
        assert_eq!(table.rows.len(), 2);

        let extraction = RecordExtractor::new(ColumnNames::default()).extract(&table).unwrap();
        assert_eq!(extraction.records[0].identifier, "101");
        assert_eq!(extraction.records[1].target_name, "p2");

        // first sheet when none is named
        let first = Table::from_path(&path, None).unwrap();
        assert_eq!(first.headers, strings(&["Notes"]));

        assert!(Table::from_path(&path, Some("Missing")).is_err());
    }

    #[test]
    fn unknown_table_extension_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("input.txt");
        std::fs::write(&path, "a,b\n").unwrap();
        assert!(matches!(
            Table::from_path(&path, None),
            Err(PhotoToolError::InvalidParameter(_))
        ));
    }
}
