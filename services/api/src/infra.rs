use chrono::NaiveDate;
use corpus_maria::academy::classes::{ClassEligibilityResolver, ClassSchedule, ScheduleImporter};
use corpus_maria::academy::{InMemoryEnrollmentRepository, InMemoryMonthlyPaymentRepository};
use corpus_maria::config::AcademyConfig;
use corpus_maria::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) academy: Arc<AcademyConfig>,
    pub(crate) resolver: ClassEligibilityResolver,
    pub(crate) enrollments: Arc<InMemoryEnrollmentRepository>,
    pub(crate) payments: Arc<InMemoryMonthlyPaymentRepository>,
}

/// The CSV timetable when one is given, the published table otherwise.
pub(crate) fn load_schedule(path: Option<&Path>) -> Result<ClassSchedule, AppError> {
    let Some(path) = path else {
        return Ok(ClassSchedule::standard());
    };

    let schedule = ScheduleImporter::from_path(path)?;
    info!(
        path = %path.display(),
        sessions = schedule.sessions().len(),
        "class schedule imported"
    );
    Ok(schedule)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.filter(|value| !value.trim().is_empty())
        .map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_path_uses_published_table() {
        let schedule = load_schedule(None).expect("standard schedule");
        assert_eq!(schedule, ClassSchedule::standard());
    }

    #[test]
    fn csv_path_replaces_the_table() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "day,start,end,min_age,max_age\nsexta,18:00,19:00,8,11").expect("write");

        let schedule = load_schedule(Some(file.path())).expect("imports");
        assert_eq!(schedule.sessions().len(), 1);
        assert_eq!(
            schedule.sessions()[0].label(),
            "Sexta-feira, 18:00 às 19:00 (8 a 11 anos)"
        );
    }

    #[test]
    fn unreadable_path_is_an_error() {
        let result = load_schedule(Some(Path::new("/nonexistent/schedule.csv")));
        assert!(matches!(result, Err(AppError::Schedule(_))));
    }

    #[test]
    fn parse_date_reports_the_raw_value() {
        let err = parse_date("2025/03/10").expect_err("rejected");
        assert!(err.contains("2025/03/10"));
    }
}
