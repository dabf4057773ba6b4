use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use csv::StringRecord;
use serde::Serialize;

use crate::model::{Period, RawTermRow, TermDataset};

#[derive(Serialize)]
struct ExportRow<'a> {
    term: &'a str,
    frequency: &'a str,
    year: i32,
    month: u32,
}

struct Columns {
    width: usize,
    term: usize,
    frequency: usize,
    year: Option<usize>,
    month: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord, path: &Path) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|header| header == name);
        let Some(term) = position("term") else {
            bail!("{} is missing the `term` column", path.display());
        };
        let Some(frequency) = position("frequency") else {
            bail!("{} is missing the `frequency` column", path.display());
        };
        Ok(Self {
            width: headers.len(),
            term,
            frequency,
            year: position("year"),
            month: position("month"),
        })
    }

    fn row(&self, record: &StringRecord) -> RawTermRow {
        if record.len() != self.width {
            return RawTermRow::malformed(format!(
                "expected {} fields, found {}",
                self.width,
                record.len()
            ));
        }
        let cell = |index: usize| record.get(index).unwrap_or_default().to_string();
        RawTermRow {
            term: cell(self.term),
            frequency: cell(self.frequency),
            year: self.year.map(cell),
            month: self.month.map(cell),
            malformed: None,
        }
    }
}

pub fn read_dataset(path: &Path) -> Result<TermDataset> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open term dataset {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("failed to read header of {}", path.display()))?
        .clone();
    let columns = Columns::from_headers(&headers, path)?;

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        match record {
            Ok(record) => rows.push(columns.row(&record)),
            Err(err) if matches!(err.kind(), csv::ErrorKind::Utf8 { .. }) => {
                rows.push(RawTermRow::malformed(err.to_string()));
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to read row {} of {}", index + 1, path.display())
                });
            }
        }
    }

    Ok(TermDataset::new(rows))
}

pub fn write_dataset(path: &Path, period: Period, dataset: &TermDataset) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for row in &dataset.rows {
        writer
            .serialize(ExportRow {
                term: &row.term,
                frequency: &row.frequency,
                year: period.year,
                month: period.month,
            })
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;

    Ok(())
}

pub fn parse_source_arg(value: &str) -> Result<(String, std::path::PathBuf)> {
    let Some((alias, path)) = value.split_once('=') else {
        bail!("expected ALIAS=PATH, got {value:?}");
    };
    let alias = alias.trim();
    let path = path.trim();
    if alias.is_empty() || path.is_empty() {
        bail!("expected ALIAS=PATH, got {value:?}");
    }
    Ok((alias.to_string(), std::path::PathBuf::from(path)))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn read_dataset_keeps_raw_cells() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "term,frequency").expect("write header");
        writeln!(file, "apple, 10").expect("write row");
        writeln!(file, "banana,XYZ").expect("write row");

        let dataset = read_dataset(file.path()).expect("read dataset");
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows[0], RawTermRow::new("apple", "10"));
        assert_eq!(dataset.rows[1].frequency, "XYZ");
    }

    #[test]
    fn read_dataset_keeps_rows_with_wrong_field_count() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "term,frequency").expect("write header");
        writeln!(file, "apple,1").expect("write row");
        writeln!(file, "banana,2,extra").expect("write row");

        let dataset = read_dataset(file.path()).expect("read dataset");
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows[0], RawTermRow::new("apple", "1"));
        assert_eq!(
            dataset.rows[1].malformed.as_deref(),
            Some("expected 2 fields, found 3")
        );
    }

    #[test]
    fn read_dataset_accepts_period_columns() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "term,year,month,frequency").expect("write header");
        writeln!(file, "headline,2022,9,1").expect("write row");

        let dataset = read_dataset(file.path()).expect("read dataset");
        assert_eq!(dataset.rows[0].year.as_deref(), Some("2022"));
        assert_eq!(dataset.rows[0].month.as_deref(), Some("9"));
    }

    #[test]
    fn read_dataset_requires_frequency_column() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "term,count").expect("write header");
        writeln!(file, "apple,1").expect("write row");

        let err = read_dataset(file.path()).expect_err("missing column");
        assert!(err.to_string().contains("frequency"));
    }

    #[test]
    fn write_then_read_preserves_period_columns() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out").join("terms.csv");
        let period = Period::new(2022, 9).expect("period");
        let dataset = TermDataset::from_counts([("apple", 2), ("orange", 2)]);

        write_dataset(&path, period, &dataset).expect("write dataset");
        let read_back = read_dataset(&path).expect("read dataset");

        assert_eq!(read_back.len(), 2);
        assert_eq!(read_back.rows[1].term, "orange");
        assert_eq!(read_back.rows[1].month.as_deref(), Some("9"));
    }

    #[test]
    fn parse_source_arg_splits_alias_and_path() {
        let (alias, path) = parse_source_arg("New York Times=terms/nyt.csv").expect("parse");
        assert_eq!(alias, "New York Times");
        assert_eq!(path, std::path::PathBuf::from("terms/nyt.csv"));
        assert!(parse_source_arg("no-separator").is_err());
        assert!(parse_source_arg("=terms.csv").is_err());
    }
}
