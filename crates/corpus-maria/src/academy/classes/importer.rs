use super::{parse_weekday, ClassSchedule, ClassSession, ScheduleError, TimeRange};
use chrono::NaiveTime;
use serde::{Deserialize, Deserializer};
use std::io::Read;
use std::path::Path;

#[derive(Debug)]
pub enum ScheduleImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { row: usize, reason: String },
    Schedule(ScheduleError),
}

impl std::fmt::Display for ScheduleImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleImportError::Io(err) => write!(f, "failed to read class schedule: {}", err),
            ScheduleImportError::Csv(err) => write!(f, "invalid class schedule CSV: {}", err),
            ScheduleImportError::InvalidRow { row, reason } => {
                write!(f, "class schedule row {}: {}", row, reason)
            }
            ScheduleImportError::Schedule(err) => write!(f, "invalid class schedule: {}", err),
        }
    }
}

impl std::error::Error for ScheduleImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScheduleImportError::Io(err) => Some(err),
            ScheduleImportError::Csv(err) => Some(err),
            ScheduleImportError::InvalidRow { .. } => None,
            ScheduleImportError::Schedule(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ScheduleImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ScheduleImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<ScheduleError> for ScheduleImportError {
    fn from(err: ScheduleError) -> Self {
        Self::Schedule(err)
    }
}

/// Loads a replacement timetable with columns `day,start,end,min_age,max_age[,label]`.
pub struct ScheduleImporter;

impl ScheduleImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ClassSchedule, ScheduleImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<ClassSchedule, ScheduleImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut sessions = Vec::new();

        for (index, record) in csv_reader.deserialize::<ScheduleRow>().enumerate() {
            // header occupies line 1
            let row = index + 2;
            let parsed = record?;
            sessions.push(parsed.into_session(row)?);
        }

        Ok(ClassSchedule::from_sessions(sessions)?)
    }
}

#[derive(Debug, Deserialize)]
struct ScheduleRow {
    day: String,
    start: String,
    end: String,
    min_age: u8,
    max_age: u8,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    label: Option<String>,
}

impl ScheduleRow {
    fn into_session(self, row: usize) -> Result<ClassSession, ScheduleImportError> {
        let invalid = |reason: String| ScheduleImportError::InvalidRow { row, reason };

        let weekday =
            parse_weekday(&self.day).ok_or_else(|| invalid(format!("unknown day '{}'", self.day)))?;
        let start = parse_clock(&self.start).ok_or_else(|| {
            invalid(format!("start '{}' is not HH:MM", self.start))
        })?;
        let end =
            parse_clock(&self.end).ok_or_else(|| invalid(format!("end '{}' is not HH:MM", self.end)))?;

        let time = TimeRange::new(start, end).map_err(|err| invalid(err.to_string()))?;
        ClassSession::new(weekday, time, self.min_age, self.max_age, self.label)
            .map_err(|err| invalid(err.to_string()))
    }
}

fn parse_clock(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty()))
}
