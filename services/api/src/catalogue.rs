use crate::infra::{load_schedule, parse_date};
use chrono::{Local, NaiveDate};
use clap::Args;
use corpus_maria::academy::classes::{ClassEligibilityResolver, ClassSessionDescriptor, Eligibility};
use corpus_maria::error::AppError;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct ListArgs {
    /// Optional CSV timetable replacing the built-in schedule
    #[arg(long)]
    pub(crate) schedule_csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct EligibleArgs {
    /// Student date of birth (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) birth_date: NaiveDate,
    /// Reference date for the age calculation (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Optional CSV timetable replacing the built-in schedule
    #[arg(long)]
    pub(crate) schedule_csv: Option<PathBuf>,
}

pub(crate) fn run_list(args: ListArgs) -> Result<(), AppError> {
    let schedule = load_schedule(args.schedule_csv.as_deref())?;
    print!("{}", render_sessions(&schedule.descriptors()));
    Ok(())
}

pub(crate) fn run_eligible(args: EligibleArgs) -> Result<(), AppError> {
    let EligibleArgs {
        birth_date,
        today,
        schedule_csv,
    } = args;

    let schedule = load_schedule(schedule_csv.as_deref())?;
    let resolver = ClassEligibilityResolver::new(schedule);
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let eligibility = resolver.resolve_date(birth_date, today)?;
    print!("{}", render_eligibility(&eligibility));
    Ok(())
}

fn render_sessions(sessions: &[ClassSessionDescriptor]) -> String {
    let mut out = format!("Class schedule ({} sessions)\n", sessions.len());
    for session in sessions {
        out.push_str(&format!(
            "- {:<14} {}  ages {}-{}\n",
            session.weekday, session.time_range, session.min_age, session.max_age
        ));
    }
    out
}

fn render_eligibility(eligibility: &Eligibility) -> String {
    let mut out = format!(
        "Born {} -> {} years old on {}\n",
        eligibility.birth_date, eligibility.age, eligibility.reference_date
    );
    match eligibility.message {
        Some(message) => {
            out.push_str(message);
            out.push('\n');
        }
        None => {
            out.push_str(&format!("{} eligible session(s):\n", eligibility.classes.len()));
            for class in &eligibility.classes {
                out.push_str(&format!("- {}\n", class.label));
            }
        }
    }
    out
}
