use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{IngestError, IngestResult};

const MIN_YEAR: i32 = 1851;
const MAX_YEAR: i32 = 9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> IngestResult<Self> {
        if !(1..=12).contains(&month) || !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(IngestError::InvalidPeriod { year, month });
        }
        Ok(Self { year, month })
    }

    pub fn previous_month(today: NaiveDate) -> Self {
        if today.month() == 1 {
            Self {
                year: today.year() - 1,
                month: 12,
            }
        } else {
            Self {
                year: today.year(),
                month: today.month() - 1,
            }
        }
    }

    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn last_day(self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|next| next.pred_opt())
            .unwrap_or_default()
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Initialised,
    InProgress,
    Success,
    Fatal,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initialised => "Initialised",
            Self::InProgress => "In Progress",
            Self::Success => "Success",
            Self::Fatal => "Fatal",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Fatal)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = IngestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Initialised" => Ok(Self::Initialised),
            "In Progress" => Ok(Self::InProgress),
            "Success" => Ok(Self::Success),
            "Fatal" => Ok(Self::Fatal),
            other => Err(IngestError::InvalidTransition(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub run_id: i64,
    pub created_at: String,
    pub updated_at: String,
    pub period: Period,
    pub status: RunStatus,
    pub commentary: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceRecord {
    pub source_id: i64,
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermRecord {
    pub term: String,
    pub frequency: i64,
}

// Cells stay unparsed until ingestion so a malformed row fails inside the batch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTermRow {
    pub term: String,
    pub frequency: String,
    pub year: Option<String>,
    pub month: Option<String>,
    pub malformed: Option<String>,
}

impl RawTermRow {
    pub fn new(term: impl Into<String>, frequency: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            frequency: frequency.into(),
            year: None,
            month: None,
            malformed: None,
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self {
            malformed: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn parse(&self, index: usize, period: Period) -> IngestResult<TermRecord> {
        if let Some(reason) = &self.malformed {
            return Err(IngestError::row_read(index, reason.clone()));
        }

        let term = self.term.trim().to_lowercase();
        if term.is_empty() {
            return Err(IngestError::row_read(index, "empty term"));
        }

        let frequency = self.frequency.trim().parse::<i64>().map_err(|_| {
            IngestError::row_read(
                index,
                format!("frequency {:?} is not an integer", self.frequency),
            )
        })?;
        if frequency < 0 {
            return Err(IngestError::row_read(
                index,
                format!("frequency {frequency} is negative"),
            ));
        }

        if let Some(year) = self.year.as_deref().filter(|value| !value.trim().is_empty()) {
            match year.trim().parse::<i32>() {
                Ok(value) if value == period.year => {}
                _ => {
                    return Err(IngestError::row_read(
                        index,
                        format!("year {year:?} does not match period {period}"),
                    ));
                }
            }
        }
        if let Some(month) = self.month.as_deref().filter(|value| !value.trim().is_empty()) {
            match month.trim().parse::<u32>() {
                Ok(value) if value == period.month => {}
                _ => {
                    return Err(IngestError::row_read(
                        index,
                        format!("month {month:?} does not match period {period}"),
                    ));
                }
            }
        }

        Ok(TermRecord { term, frequency })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermDataset {
    pub rows: Vec<RawTermRow>,
}

impl TermDataset {
    pub fn new(rows: Vec<RawTermRow>) -> Self {
        Self { rows }
    }

    pub fn from_counts<I, S>(counts: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let rows = counts
            .into_iter()
            .map(|(term, frequency)| RawTermRow::new(term, frequency.to_string()))
            .collect();
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Headline {
    pub publication_date: NaiveDate,
    pub headline: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceCounts {
    pub source_alias: String,
    pub source_id: Option<i64>,
    pub rows_seen: usize,
    pub inserted: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub run_id: i64,
    pub period: Period,
    pub status: RunStatus,
    pub commentary: Option<String>,
    pub skipped: bool,
    pub sources: Vec<SourceCounts>,
    pub completed_at: String,
}

impl BatchOutcome {
    pub fn inserted_total(&self) -> usize {
        self.sources.iter().map(|counts| counts.inserted).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_rejects_out_of_range_month() {
        assert!(Period::new(2022, 0).is_err());
        assert!(Period::new(2022, 13).is_err());
        assert!(Period::new(1700, 1).is_err());
        assert_eq!(Period::new(2022, 9).expect("period").to_string(), "2022-09");
    }

    #[test]
    fn previous_month_wraps_year() {
        let january = NaiveDate::from_ymd_opt(2024, 1, 15).expect("date");
        assert_eq!(Period::previous_month(january), Period { year: 2023, month: 12 });

        let july = NaiveDate::from_ymd_opt(2024, 7, 1).expect("date");
        assert_eq!(Period::previous_month(july), Period { year: 2024, month: 6 });
    }

    #[test]
    fn last_day_handles_leap_february_and_december() {
        let february = Period::new(2024, 2).expect("period");
        assert_eq!(february.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29).expect("date"));

        let december = Period::new(2023, 12).expect("period");
        assert_eq!(december.first_day(), NaiveDate::from_ymd_opt(2023, 12, 1).expect("date"));
        assert_eq!(december.last_day(), NaiveDate::from_ymd_opt(2023, 12, 31).expect("date"));
    }

    #[test]
    fn run_status_text_round_trips() {
        for status in [
            RunStatus::Initialised,
            RunStatus::InProgress,
            RunStatus::Success,
            RunStatus::Fatal,
        ] {
            assert_eq!(status.as_str().parse::<RunStatus>().expect("parse"), status);
        }
        assert!("Done".parse::<RunStatus>().is_err());
        assert!(!RunStatus::InProgress.is_terminal());
    }

    #[test]
    fn raw_row_parse_validates_cells() {
        let period = Period::new(2022, 1).expect("period");

        let parsed = RawTermRow::new(" apple ", " 10 ").parse(1, period).expect("valid row");
        assert_eq!(
            parsed,
            TermRecord {
                term: "apple".to_string(),
                frequency: 10
            }
        );

        for (term, frequency) in [("apple", "XYZ"), ("apple", "-1"), ("apple", "1.5"), ("", "3")] {
            let err = RawTermRow::new(term, frequency)
                .parse(4, period)
                .expect_err("invalid row");
            assert!(matches!(err, IngestError::RowRead { row: 4, .. }));
        }
    }

    #[test]
    fn raw_row_parse_lowercases_term() {
        let period = Period::new(2022, 1).expect("period");

        let parsed = RawTermRow::new("Apple", "3").parse(1, period).expect("valid row");
        assert_eq!(parsed.term, "apple");
    }

    #[test]
    fn malformed_raw_row_is_rejected() {
        let period = Period::new(2022, 1).expect("period");

        let err = RawTermRow::malformed("expected 2 fields, found 3")
            .parse(2, period)
            .expect_err("malformed row");
        match err {
            IngestError::RowRead { row, reason } => {
                assert_eq!(row, 2);
                assert!(reason.contains("3"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
