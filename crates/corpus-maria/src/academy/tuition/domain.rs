use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::academy::enrollment::EnrollmentId;
use crate::academy::money::Money;

/// Fallback used when an enrollment row carries no student name.
pub const UNNAMED_STUDENT: &str = "Aluna sem nome";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthlyPaymentId(pub Uuid);

impl MonthlyPaymentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MonthlyPaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for MonthlyPaymentId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim()).map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TuitionStatus {
    Pending,
    Paid,
}

impl TuitionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TuitionStatus::Pending => "Pendente",
            TuitionStatus::Paid => "Pago",
        }
    }
}

/// Calendar month a tuition charge refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub year: i32,
    pub month: u32,
}

impl BillingPeriod {
    pub fn new(month: u32, year: i32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn month_name(&self) -> &'static str {
        const MONTHS: [&str; 12] = [
            "Janeiro",
            "Fevereiro",
            "Março",
            "Abril",
            "Maio",
            "Junho",
            "Julho",
            "Agosto",
            "Setembro",
            "Outubro",
            "Novembro",
            "Dezembro",
        ];
        MONTHS[(self.month.clamp(1, 12) - 1) as usize]
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.month_name(), self.year)
    }
}

/// Recurring tuition charge linked to an enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyPayment {
    pub id: MonthlyPaymentId,
    pub enrollment_id: EnrollmentId,
    pub student_name: String,
    pub month: u32,
    pub year: i32,
    #[serde(rename = "amount_cents")]
    pub amount: Money,
    pub status: TuitionStatus,
    pub payment_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub payment_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MonthlyPayment {
    pub fn period(&self) -> BillingPeriod {
        BillingPeriod {
            year: self.year,
            month: self.month,
        }
    }
}

/// Request body for a new charge. Fields are optional so missing ones can be
/// reported together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMonthlyPayment {
    #[serde(default)]
    pub enrollment_id: Option<EnrollmentId>,
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default, rename = "amount_cents")]
    pub amount: Option<Money>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyPaymentUpdate {
    #[serde(default)]
    pub status: Option<TuitionStatus>,
    #[serde(default, rename = "amount_cents")]
    pub amount: Option<Money>,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payment_notes: Option<String>,
}

/// Optional filters for listing charges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyPaymentQuery {
    #[serde(default)]
    pub enrollment_id: Option<EnrollmentId>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub year: Option<i32>,
}

impl MonthlyPaymentQuery {
    pub fn for_period(period: BillingPeriod) -> Self {
        Self {
            enrollment_id: None,
            month: Some(period.month),
            year: Some(period.year),
        }
    }

    pub fn matches(&self, payment: &MonthlyPayment) -> bool {
        self.enrollment_id
            .map_or(true, |id| id == payment.enrollment_id)
            && self.month.map_or(true, |month| month == payment.month)
            && self.year.map_or(true, |year| year == payment.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billing_period_rejects_out_of_range_months() {
        assert!(BillingPeriod::new(0, 2025).is_none());
        assert!(BillingPeriod::new(13, 2025).is_none());
        let march = BillingPeriod::new(3, 2025).expect("valid period");
        assert_eq!(march.to_string(), "Março/2025");
    }

    #[test]
    fn periods_order_chronologically() {
        let december = BillingPeriod::new(12, 2024).expect("valid");
        let january = BillingPeriod::new(1, 2025).expect("valid");
        assert!(december < january);
    }

    #[test]
    fn new_payment_reads_partial_json() {
        let request: NewMonthlyPayment =
            serde_json::from_str(r#"{"student_name":"Helena","month":4}"#).expect("parse");
        assert_eq!(request.student_name.as_deref(), Some("Helena"));
        assert_eq!(request.month, Some(4));
        assert!(request.enrollment_id.is_none());
        assert!(request.amount.is_none());
    }
}
