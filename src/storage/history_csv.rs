use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use std::{fs::File, io::Read, path::Path};

use crate::{
    error::{AppError, AppResult},
    models::MealLogEntry,
};

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Deserialize)]
struct HistoryRecord {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Meal")]
    meal: String,
}

/// Reads a `Date,Meal` CSV file into a chronological meal log
pub fn load_history(path: impl AsRef<Path>) -> AppResult<Vec<MealLogEntry>> {
    let path = path.as_ref();
    tracing::info!(path = %path.display(), "Loading meal history");
    let entries = read_history(File::open(path)?)?;
    tracing::info!(entries = entries.len(), "Meal history loaded");
    Ok(entries)
}

/// Parses `Date,Meal` CSV rows.
///
/// Dates are `YYYY-MM-DD` or carry a time of day. Rows are sorted by date;
/// rows sharing a timestamp keep file order.
pub fn read_history<R: Read>(reader: R) -> AppResult<Vec<MealLogEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut entries = Vec::new();
    for (i, record) in reader.deserialize::<HistoryRecord>().enumerate() {
        // Header is line 1
        let line = i + 2;
        let record =
            record.map_err(|e| AppError::InvalidInput(format!("history line {}: {}", line, e)))?;

        let date = parse_timestamp(&record.date).ok_or_else(|| {
            AppError::InvalidInput(format!(
                "history line {}: unrecognised date `{}`",
                line, record.date
            ))
        })?;
        if record.meal.is_empty() {
            return Err(AppError::InvalidInput(format!("history line {}: empty meal name", line)));
        }

        entries.push(MealLogEntry::new(date, record.meal));
    }

    entries.sort_by_key(|e| e.date);
    Ok(entries)
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_reads_and_sorts() {
        let csv = "Date,Meal\n\
                   2024-01-02 13:00,Sambar Rice\n\
                   2024-01-01,Idli\n\
                   2024-01-02 08:00:00, Dosa \n";
        let entries = read_history(csv.as_bytes()).unwrap();

        let meals: Vec<&str> = entries.iter().map(|e| e.meal.as_str()).collect();
        assert_eq!(meals, vec!["Idli", "Dosa", "Sambar Rice"]);
        assert_eq!(entries[0].date.time(), NaiveTime::MIN);
        assert_eq!(entries[2].date.format("%H:%M").to_string(), "13:00");
    }

    #[test]
    fn test_reports_bad_line() {
        let csv = "Date,Meal\n2024-01-01,Idli\nyesterday,Dosa\n";
        let err = read_history(csv.as_bytes()).unwrap_err();
        assert!(matches!(&err, AppError::InvalidInput(msg) if msg.contains("line 3")));
    }

    #[test]
    fn test_rejects_empty_meal() {
        let csv = "Date,Meal\n2024-01-01,\n";
        assert!(matches!(read_history(csv.as_bytes()), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Date,Meal").unwrap();
        writeln!(file, "2024-03-05 20:00,biryani").unwrap();

        let entries = load_history(file.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].meal, "biryani");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            load_history("/nonexistent/meals.csv"),
            Err(AppError::Io(_))
        ));
    }
}
