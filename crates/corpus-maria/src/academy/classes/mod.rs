//! Weekly class sessions and the age-based eligibility rules that gate enrollment.
//!
//! The schedule is loaded once (built-in table or CSV import) and never mutated
//! afterwards, so it can be shared freely between request handlers.

mod eligibility;
mod importer;

use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use eligibility::{
    compute_age, parse_birth_date, ClassEligibilityResolver, Eligibility, EligibilityError,
    NO_CLASS_AVAILABLE_MESSAGE,
};
pub use importer::{ScheduleImportError, ScheduleImporter};

/// Start and end of a session, in minutes after midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    start: u16,
    end: u16,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, ScheduleError> {
        if start >= end {
            return Err(ScheduleError::InvalidTimeRange {
                start: start.format("%H:%M").to_string(),
                end: end.format("%H:%M").to_string(),
            });
        }
        Ok(Self {
            start: minutes_of(start),
            end: minutes_of(end),
        })
    }

    const fn from_hm(start: (u16, u16), end: (u16, u16)) -> Self {
        Self {
            start: start.0 * 60 + start.1,
            end: end.0 * 60 + end.1,
        }
    }

    pub fn start_label(&self) -> String {
        clock_label(self.start)
    }

    pub fn end_label(&self) -> String {
        clock_label(self.end)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start_label(), self.end_label())
    }
}

fn minutes_of(time: NaiveTime) -> u16 {
    (time.hour() * 60 + time.minute()) as u16
}

fn clock_label(minutes: u16) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// A fixed weekly slot open to students within an inclusive age range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSession {
    weekday: Weekday,
    time: TimeRange,
    min_age: u8,
    max_age: u8,
    label: String,
}

impl ClassSession {
    /// Builds a session, generating the display label when none is supplied.
    pub fn new(
        weekday: Weekday,
        time: TimeRange,
        min_age: u8,
        max_age: u8,
        label: Option<String>,
    ) -> Result<Self, ScheduleError> {
        if min_age > max_age {
            return Err(ScheduleError::InvalidAgeRange { min_age, max_age });
        }
        let label = label.unwrap_or_else(|| session_label(weekday, &time, min_age, max_age));
        Ok(Self {
            weekday,
            time,
            min_age,
            max_age,
            label,
        })
    }

    fn standard(weekday: Weekday, time: TimeRange, min_age: u8, max_age: u8) -> Self {
        let label = session_label(weekday, &time, min_age, max_age);
        Self {
            weekday,
            time,
            min_age,
            max_age,
            label,
        }
    }

    pub fn weekday(&self) -> Weekday {
        self.weekday
    }

    pub fn time(&self) -> TimeRange {
        self.time
    }

    pub fn min_age(&self) -> u8 {
        self.min_age
    }

    pub fn max_age(&self) -> u8 {
        self.max_age
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn admits(&self, age: u32) -> bool {
        age >= u32::from(self.min_age) && age <= u32::from(self.max_age)
    }

    pub fn descriptor(&self) -> ClassSessionDescriptor {
        ClassSessionDescriptor {
            label: self.label.clone(),
            weekday: weekday_label(self.weekday).to_string(),
            time_range: self.time.to_string(),
            min_age: self.min_age,
            max_age: self.max_age,
        }
    }
}

/// Serializable view of a session exposed to the enrollment form and CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSessionDescriptor {
    pub label: String,
    pub weekday: String,
    pub time_range: String,
    pub min_age: u8,
    pub max_age: u8,
}

/// Ordered table of the academy's sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSchedule {
    sessions: Vec<ClassSession>,
}

impl ClassSchedule {
    /// The published ballet timetable.
    pub fn standard() -> Self {
        Self {
            sessions: standard_sessions(),
        }
    }

    pub fn from_sessions(sessions: Vec<ClassSession>) -> Result<Self, ScheduleError> {
        if sessions.is_empty() {
            return Err(ScheduleError::Empty);
        }
        Ok(Self { sessions })
    }

    pub fn sessions(&self) -> &[ClassSession] {
        &self.sessions
    }

    /// Sessions admitting `age`, in table order.
    pub fn available_for(&self, age: u32) -> Vec<&ClassSession> {
        self.sessions
            .iter()
            .filter(|session| session.admits(age))
            .collect()
    }

    pub fn find_by_label(&self, label: &str) -> Option<&ClassSession> {
        let label = label.trim();
        self.sessions
            .iter()
            .find(|session| session.label == label)
    }

    pub fn descriptors(&self) -> Vec<ClassSessionDescriptor> {
        self.sessions.iter().map(ClassSession::descriptor).collect()
    }
}

impl Default for ClassSchedule {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_sessions() -> Vec<ClassSession> {
    [
        (Weekday::Mon, (17, 30), (18, 30), 4, 6),
        (Weekday::Mon, (18, 30), (19, 30), 7, 9),
        (Weekday::Mon, (19, 30), (20, 30), 13, 17),
        (Weekday::Tue, (9, 30), (10, 30), 4, 6),
        (Weekday::Tue, (17, 30), (18, 30), 4, 6),
        (Weekday::Tue, (18, 30), (19, 30), 10, 12),
        (Weekday::Tue, (19, 30), (20, 30), 10, 12),
    ]
    .into_iter()
    .map(|(weekday, start, end, min_age, max_age)| {
        ClassSession::standard(weekday, TimeRange::from_hm(start, end), min_age, max_age)
    })
    .collect()
}

/// Portuguese weekday name used on every family-facing label.
pub fn weekday_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Segunda-feira",
        Weekday::Tue => "Terça-feira",
        Weekday::Wed => "Quarta-feira",
        Weekday::Thu => "Quinta-feira",
        Weekday::Fri => "Sexta-feira",
        Weekday::Sat => "Sábado",
        Weekday::Sun => "Domingo",
    }
}

/// Accepts Portuguese names with or without accents and the `-feira` suffix,
/// falling back to English names and abbreviations.
pub fn parse_weekday(raw: &str) -> Option<Weekday> {
    let folded: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'ç' => 'c',
            'á' | 'à' | 'â' | 'ã' => 'a',
            other => other,
        })
        .collect();
    let stem = folded.trim_end_matches("-feira").trim_end_matches(" feira");

    match stem {
        "segunda" | "seg" => Some(Weekday::Mon),
        "terca" | "ter" => Some(Weekday::Tue),
        "quarta" | "qua" => Some(Weekday::Wed),
        "quinta" | "qui" => Some(Weekday::Thu),
        "sexta" | "sex" => Some(Weekday::Fri),
        "sabado" | "sab" => Some(Weekday::Sat),
        "domingo" | "dom" => Some(Weekday::Sun),
        other => other.parse::<Weekday>().ok(),
    }
}

fn session_label(weekday: Weekday, time: &TimeRange, min_age: u8, max_age: u8) -> String {
    format!(
        "{}, {} às {} ({})",
        weekday_label(weekday),
        time.start_label(),
        time.end_label(),
        age_phrase(min_age, max_age)
    )
}

fn age_phrase(min_age: u8, max_age: u8) -> String {
    match max_age - min_age {
        0 => format!("{min_age} anos"),
        1 => format!("{min_age} e {max_age} anos"),
        2 => format!("{min_age}, {} e {max_age} anos", min_age + 1),
        _ => format!("{min_age} a {max_age} anos"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("minimum age {min_age} exceeds maximum age {max_age}")]
    InvalidAgeRange { min_age: u8, max_age: u8 },
    #[error("session must start before it ends ({start} - {end})")]
    InvalidTimeRange { start: String, end: String },
    #[error("class schedule has no sessions")]
    Empty,
}
