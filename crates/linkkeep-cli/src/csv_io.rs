//! CSV import and export
//!
//! Columns: `url,description,categories,tags,created_at,last_updated`.
//! `categories` and `tags` cells hold comma-joined lists. Only `url` is
//! required on import; the timestamp columns are ignored there.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::warn;

use linkkeep_core::models::split_list;
use linkkeep_core::LinkRecord;

/// Column order written on export
pub const HEADER: [&str; 6] = [
    "url",
    "description",
    "categories",
    "tags",
    "created_at",
    "last_updated",
];

/// Records read from a CSV file
#[derive(Debug, Default)]
pub struct CsvRows {
    pub records: Vec<LinkRecord>,
    /// Rows the CSV reader could not decode
    pub unreadable: usize,
}

/// Read link records from a CSV file with a header row
pub fn read_records(path: &Path) -> Result<CsvRows> {
    if !path.exists() {
        bail!("File not found: {}", path.display());
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header: {}", path.display()))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    let Some(url_col) = column("url") else {
        bail!("CSV file missing required field 'url'");
    };
    let description_col = column("description");
    let categories_col = column("categories");
    let tags_col = column("tags");

    let mut rows = CsvRows::default();
    for (line, row) in reader.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!("Skipping unreadable CSV row {}: {}", line + 2, e);
                rows.unreadable += 1;
                continue;
            }
        };
        let cell = |col: Option<usize>| col.and_then(|c| row.get(c)).unwrap_or("");

        rows.records.push(
            LinkRecord::new(cell(Some(url_col)))
                .with_description(cell(description_col))
                .with_categories(split_list(cell(categories_col)))
                .with_tags(split_list(cell(tags_col))),
        );
    }

    Ok(rows)
}

/// Write link records to a CSV file, returning the number of rows written
pub fn write_records(path: &Path, records: &[LinkRecord]) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

    writer.write_record(HEADER)?;
    for record in records {
        let categories = record.categories.join(",");
        let tags = record.tags.join(",");
        let created_at = format_timestamp(record.created_at);
        let last_updated = format_timestamp(record.last_updated);
        writer.write_record([
            record.url.as_str(),
            record.description.as_str(),
            categories.as_str(),
            tags.as_str(),
            created_at.as_str(),
            last_updated.as_str(),
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;

    Ok(records.len())
}

fn format_timestamp(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_records() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("links.csv");
        fs::write(
            &path,
            "url,description,categories,tags\n\
             example.com,Example,\"dev, reading\",rust\n\
             ,No url,,\n\
             https://b.com,,,\n",
        )
        .unwrap();

        let rows = read_records(&path).unwrap();
        assert_eq!(rows.unreadable, 0);
        assert_eq!(rows.records.len(), 3);

        let first = &rows.records[0];
        assert_eq!(first.url, "example.com");
        assert_eq!(first.description, "Example");
        assert_eq!(first.categories, vec!["dev", "reading"]);
        assert_eq!(first.tags, vec!["rust"]);

        assert_eq!(rows.records[1].url, "");
        assert!(rows.records[2].tags.is_empty());
    }

    #[test]
    fn test_read_requires_url_column() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("links.csv");
        fs::write(&path, "link,description\nexample.com,Example\n").unwrap();

        let err = read_records(&path).unwrap_err();
        assert!(err.to_string().contains("missing required field 'url'"));
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_records(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("export.csv");
        let records = vec![
            LinkRecord::new("https://a.com")
                .with_description("Alpha, with comma")
                .with_categories(vec!["dev".into(), "news".into()])
                .with_tags(vec!["x".into()]),
            LinkRecord::new("https://b.com"),
        ];

        assert_eq!(write_records(&path, &records).unwrap(), 2);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("url,description,categories,tags,created_at,last_updated\n"));

        let rows = read_records(&path).unwrap();
        assert_eq!(rows.records, records);
    }

    #[test]
    fn test_format_timestamp() {
        use chrono::TimeZone;
        let ts = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        assert_eq!(format_timestamp(Some(ts)), "2024-05-06T07:08:09Z");
        assert_eq!(format_timestamp(None), "");
    }
}
