use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::academy::money::Money;

/// Identifier wrapper for enrollments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnrollmentId(pub Uuid);

impl EnrollmentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for EnrollmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for EnrollmentId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim()).map(Self)
    }
}

/// Enrollment fee state as stored by the back-office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "aguardando_pagamento")]
    AwaitingPayment,
    #[serde(rename = "pago")]
    Paid,
}

impl PaymentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::AwaitingPayment => "Aguardando Pagamento",
            PaymentStatus::Paid => "Pago",
        }
    }
}

/// Dashboard filter over [`PaymentStatus`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentFilter {
    #[default]
    All,
    Paid,
    Pending,
}

impl EnrollmentFilter {
    pub fn matches(&self, status: PaymentStatus) -> bool {
        match self {
            EnrollmentFilter::All => true,
            EnrollmentFilter::Paid => status == PaymentStatus::Paid,
            EnrollmentFilter::Pending => status == PaymentStatus::AwaitingPayment,
        }
    }
}

/// Brazilian taxpayer number of the responsible adult, kept as its 11 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cpf(String);

impl Cpf {
    /// Strips punctuation; anything other than 11 remaining digits is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let digits = digits_only(raw);
        (digits.len() == 11).then_some(Self(digits))
    }

    pub fn digits(&self) -> &str {
        &self.0
    }

    /// `123.456.789-00`
    pub fn formatted(&self) -> String {
        format!(
            "{}.{}.{}-{}",
            &self.0[0..3],
            &self.0[3..6],
            &self.0[6..9],
            &self.0[9..11]
        )
    }
}

pub(crate) fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// `(54) 99901-0633` for 11-digit mobiles, `(54) 3333-0633` for landlines,
/// raw digits otherwise.
pub fn format_phone(digits: &str) -> String {
    if !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return digits.to_string();
    }
    match digits.len() {
        11 => format!("({}) {}-{}", &digits[0..2], &digits[2..7], &digits[7..11]),
        10 => format!("({}) {}-{}", &digits[0..2], &digits[2..6], &digits[6..10]),
        _ => digits.to_string(),
    }
}

/// Payload posted by the public enrollment form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentSubmission {
    pub full_name: String,
    pub address: String,
    pub phone: String,
    pub cpf: String,
    pub date_of_birth: String,
    #[serde(default)]
    pub selected_class: Option<String>,
    #[serde(default)]
    pub shift: Option<String>,
}

/// Stored enrollment row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub full_name: String,
    pub address: String,
    pub phone: String,
    pub cpf: Cpf,
    pub date_of_birth: NaiveDate,
    pub age: u32,
    pub selected_class: String,
    pub shift: Option<String>,
    pub payment_status: PaymentStatus,
    #[serde(rename = "payment_amount_cents")]
    pub payment_amount: Option<Money>,
    pub payment_method: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Enrollment {
    pub fn view(&self) -> EnrollmentView {
        EnrollmentView {
            id: self.id,
            full_name: self.full_name.clone(),
            address: self.address.clone(),
            phone: format_phone(&self.phone),
            cpf: self.cpf.formatted(),
            date_of_birth: self.date_of_birth,
            age: self.age,
            selected_class: self.selected_class.clone(),
            shift: self.shift.clone(),
            payment_status: self.payment_status,
            payment_status_label: self.payment_status.label(),
            payment_amount: self.payment_amount,
            payment_method: self.payment_method.clone(),
            payment_date: self.payment_date,
            notes: self.notes.clone(),
            created_at: self.created_at,
        }
    }
}

/// Back-office representation with display formatting applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrollmentView {
    pub id: EnrollmentId,
    pub full_name: String,
    pub address: String,
    pub phone: String,
    pub cpf: String,
    pub date_of_birth: NaiveDate,
    pub age: u32,
    pub selected_class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift: Option<String>,
    pub payment_status: PaymentStatus,
    pub payment_status_label: &'static str,
    #[serde(rename = "payment_amount_cents", skip_serializing_if = "Option::is_none")]
    pub payment_amount: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Changes an administrator may apply to an enrollment's fee record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentUpdate {
    pub payment_status: PaymentStatus,
    #[serde(default, rename = "payment_amount_cents")]
    pub payment_amount: Option<Money>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpf_accepts_punctuated_and_bare_digits() {
        let formatted = Cpf::parse("123.456.789-00").expect("valid cpf");
        let bare = Cpf::parse("12345678900").expect("valid cpf");
        assert_eq!(formatted, bare);
        assert_eq!(bare.digits(), "12345678900");
        assert_eq!(bare.formatted(), "123.456.789-00");
    }

    #[test]
    fn cpf_rejects_wrong_lengths() {
        assert!(Cpf::parse("123.456.789-0").is_none());
        assert!(Cpf::parse("123.456.789-000").is_none());
        assert!(Cpf::parse("abc").is_none());
    }

    #[test]
    fn phone_formatting_handles_mobile_and_landline() {
        assert_eq!(format_phone("54999010633"), "(54) 99901-0633");
        assert_eq!(format_phone("5433330633"), "(54) 3333-0633");
        assert_eq!(format_phone("0633"), "0633");
    }

    #[test]
    fn payment_status_uses_portuguese_wire_names() {
        assert_eq!(
            serde_json::to_value(PaymentStatus::AwaitingPayment).expect("serialize"),
            serde_json::json!("aguardando_pagamento")
        );
        let parsed: PaymentStatus = serde_json::from_str("\"pago\"").expect("deserialize");
        assert_eq!(parsed, PaymentStatus::Paid);
        assert_eq!(parsed.label(), "Pago");
    }

    #[test]
    fn filter_matches_statuses() {
        assert!(EnrollmentFilter::All.matches(PaymentStatus::Paid));
        assert!(EnrollmentFilter::Paid.matches(PaymentStatus::Paid));
        assert!(!EnrollmentFilter::Paid.matches(PaymentStatus::AwaitingPayment));
        assert!(EnrollmentFilter::Pending.matches(PaymentStatus::AwaitingPayment));
    }

    #[test]
    fn enrollment_id_parses_uuid_strings() {
        let id = EnrollmentId::generate();
        let parsed: EnrollmentId = id.to_string().parse().expect("round trip");
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<EnrollmentId>().is_err());
    }
}
