//! Back-office aggregates: the finance report and the enrollment dashboard.

use std::collections::BTreeMap;

use serde::Serialize;

use super::enrollment::{Enrollment, EnrollmentFilter, EnrollmentView, PaymentStatus};
use super::money::Money;
use super::tuition::{BillingPeriod, MonthlyPayment, TuitionStatus};

/// Enrollments opened in one calendar month, keyed `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyEnrollments {
    pub month: String,
    pub enrollments: usize,
    #[serde(rename = "revenue_cents")]
    pub revenue: Money,
    pub cumulative_enrollments: usize,
    #[serde(rename = "cumulative_revenue_cents")]
    pub cumulative_revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TuitionTotals {
    pub period: BillingPeriod,
    pub paid_count: usize,
    pub pending_count: usize,
    #[serde(rename = "paid_cents")]
    pub paid: Money,
    #[serde(rename = "pending_cents")]
    pub pending: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinanceSummary {
    pub total_students: usize,
    pub paid_students: usize,
    pub pending_students: usize,
    #[serde(rename = "enrollment_fee_cents")]
    pub enrollment_fee: Money,
    #[serde(rename = "revenue_cents")]
    pub revenue: Money,
    #[serde(rename = "pending_revenue_cents")]
    pub pending_revenue: Money,
    pub reference_period: BillingPeriod,
    pub enrollments_in_period: usize,
    pub monthly: Vec<MonthlyEnrollments>,
    pub tuition: TuitionTotals,
}

/// Fee revenue counts each enrollment once at the configured fee; the month of
/// an enrollment is the UTC date it was created.
pub fn summarize(
    enrollments: &[Enrollment],
    payments: &[MonthlyPayment],
    enrollment_fee: Money,
    period: BillingPeriod,
) -> FinanceSummary {
    let paid_students = count_status(enrollments, PaymentStatus::Paid);
    let pending_students = count_status(enrollments, PaymentStatus::AwaitingPayment);

    let mut by_month: BTreeMap<BillingPeriod, usize> = BTreeMap::new();
    for enrollment in enrollments {
        let opened = BillingPeriod::containing(enrollment.created_at.date_naive());
        *by_month.entry(opened).or_default() += 1;
    }

    let mut cumulative_enrollments = 0;
    let monthly = by_month
        .iter()
        .map(|(month, &count)| {
            cumulative_enrollments += count;
            MonthlyEnrollments {
                month: format!("{:04}-{:02}", month.year, month.month),
                enrollments: count,
                revenue: enrollment_fee * count,
                cumulative_enrollments,
                cumulative_revenue: enrollment_fee * cumulative_enrollments,
            }
        })
        .collect();

    FinanceSummary {
        total_students: enrollments.len(),
        paid_students,
        pending_students,
        enrollment_fee,
        revenue: enrollment_fee * paid_students,
        pending_revenue: enrollment_fee * pending_students,
        reference_period: period,
        enrollments_in_period: by_month.get(&period).copied().unwrap_or(0),
        monthly,
        tuition: tuition_totals(payments, period),
    }
}

pub fn tuition_totals(payments: &[MonthlyPayment], period: BillingPeriod) -> TuitionTotals {
    let (paid, pending): (Vec<&MonthlyPayment>, Vec<&MonthlyPayment>) = payments
        .iter()
        .filter(|payment| payment.period() == period)
        .partition(|payment| payment.status == TuitionStatus::Paid);

    TuitionTotals {
        period,
        paid_count: paid.len(),
        pending_count: pending.len(),
        paid: paid.iter().map(|payment| payment.amount).sum(),
        pending: pending.iter().map(|payment| payment.amount).sum(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardEntry {
    pub enrollment: EnrollmentView,
    pub monthly_payments: Vec<MonthlyPayment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    pub filter: EnrollmentFilter,
    pub paid: usize,
    pub pending: usize,
    #[serde(rename = "enrollment_revenue_cents")]
    pub enrollment_revenue: Money,
    pub entries: Vec<DashboardEntry>,
}

/// Counters cover every enrollment; `entries` holds the filtered ones,
/// newest first, each with its charges newest period first.
pub fn dashboard(
    enrollments: &[Enrollment],
    payments: &[MonthlyPayment],
    filter: EnrollmentFilter,
    enrollment_fee: Money,
) -> DashboardView {
    let paid = count_status(enrollments, PaymentStatus::Paid);
    let pending = count_status(enrollments, PaymentStatus::AwaitingPayment);

    let mut selected: Vec<&Enrollment> = enrollments
        .iter()
        .filter(|enrollment| filter.matches(enrollment.payment_status))
        .collect();
    selected.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.0.cmp(&b.id.0))
    });

    let entries = selected
        .into_iter()
        .map(|enrollment| {
            let mut monthly_payments: Vec<MonthlyPayment> = payments
                .iter()
                .filter(|payment| payment.enrollment_id == enrollment.id)
                .cloned()
                .collect();
            monthly_payments.sort_by(|a, b| {
                b.period().cmp(&a.period()).then_with(|| a.id.0.cmp(&b.id.0))
            });
            DashboardEntry {
                enrollment: enrollment.view(),
                monthly_payments,
            }
        })
        .collect();

    DashboardView {
        filter,
        paid,
        pending,
        enrollment_revenue: enrollment_fee * paid,
        entries,
    }
}

fn count_status(enrollments: &[Enrollment], status: PaymentStatus) -> usize {
    enrollments
        .iter()
        .filter(|enrollment| enrollment.payment_status == status)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::academy::enrollment::{Cpf, EnrollmentId};
    use crate::academy::tuition::MonthlyPaymentId;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 15, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn enrollment(cpf: &str, status: PaymentStatus, created_at: DateTime<Utc>) -> Enrollment {
        Enrollment {
            id: EnrollmentId::generate(),
            full_name: format!("Aluna {cpf}"),
            address: "Rua das Flores, 10".to_string(),
            phone: "54999010633".to_string(),
            cpf: Cpf::parse(cpf).expect("valid cpf"),
            date_of_birth: NaiveDate::from_ymd_opt(2019, 3, 10).expect("valid date"),
            age: 5,
            selected_class: "Segunda-feira, 17:30 às 18:30 (4 a 6 anos)".to_string(),
            shift: None,
            payment_status: status,
            payment_amount: None,
            payment_method: None,
            payment_date: None,
            notes: None,
            created_at,
        }
    }

    fn charge(enrollment: &Enrollment, month: u32, status: TuitionStatus) -> MonthlyPayment {
        MonthlyPayment {
            id: MonthlyPaymentId::generate(),
            enrollment_id: enrollment.id,
            student_name: enrollment.full_name.clone(),
            month,
            year: 2025,
            amount: Money::from_cents(10_000),
            status,
            payment_date: None,
            payment_method: None,
            payment_notes: None,
            created_at: at(2025, month, 1),
        }
    }

    fn fixture() -> (Vec<Enrollment>, Vec<MonthlyPayment>) {
        let enrollments = vec![
            enrollment("11111111111", PaymentStatus::Paid, at(2025, 2, 3)),
            enrollment("22222222222", PaymentStatus::AwaitingPayment, at(2025, 3, 4)),
            enrollment("33333333333", PaymentStatus::Paid, at(2025, 3, 20)),
        ];
        let payments = vec![
            charge(&enrollments[0], 3, TuitionStatus::Paid),
            charge(&enrollments[1], 3, TuitionStatus::Pending),
            charge(&enrollments[0], 2, TuitionStatus::Paid),
        ];
        (enrollments, payments)
    }

    #[test]
    fn summary_counts_fee_revenue_and_months() {
        let (enrollments, payments) = fixture();
        let march = BillingPeriod::new(3, 2025).expect("valid period");
        let summary = summarize(&enrollments, &payments, Money::from_cents(8_000), march);

        assert_eq!(summary.total_students, 3);
        assert_eq!(summary.paid_students, 2);
        assert_eq!(summary.pending_students, 1);
        assert_eq!(summary.revenue, Money::from_cents(16_000));
        assert_eq!(summary.pending_revenue, Money::from_cents(8_000));
        assert_eq!(summary.enrollments_in_period, 2);

        let months: Vec<&str> = summary.monthly.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, ["2025-02", "2025-03"]);
        assert_eq!(summary.monthly[1].cumulative_enrollments, 3);
        assert_eq!(summary.monthly[1].cumulative_revenue, Money::from_cents(24_000));

        assert_eq!(summary.tuition.paid_count, 1);
        assert_eq!(summary.tuition.pending_count, 1);
        assert_eq!(summary.tuition.paid, Money::from_cents(10_000));
        assert_eq!(summary.tuition.pending, Money::from_cents(10_000));
    }

    #[test]
    fn empty_store_summarizes_to_zero() {
        let period = BillingPeriod::new(1, 2025).expect("valid period");
        let summary = summarize(&[], &[], Money::from_cents(8_000), period);
        assert_eq!(summary.total_students, 0);
        assert_eq!(summary.revenue, Money::ZERO);
        assert!(summary.monthly.is_empty());
        assert_eq!(summary.tuition.paid, Money::ZERO);
    }

    #[test]
    fn dashboard_filters_entries_but_counts_everything() {
        let (enrollments, payments) = fixture();
        let view = dashboard(
            &enrollments,
            &payments,
            EnrollmentFilter::Paid,
            Money::from_cents(8_000),
        );

        assert_eq!(view.paid, 2);
        assert_eq!(view.pending, 1);
        assert_eq!(view.enrollment_revenue, Money::from_cents(16_000));
        assert_eq!(view.entries.len(), 2);
        assert_eq!(view.entries[0].enrollment.id, enrollments[2].id);

        let oldest = &view.entries[1];
        let months: Vec<u32> = oldest.monthly_payments.iter().map(|p| p.month).collect();
        assert_eq!(months, [3, 2]);
    }

    #[test]
    fn dashboard_orders_same_instant_enrollments_by_id() {
        let created = at(2025, 3, 4);
        let enrollments = vec![
            enrollment("44444444444", PaymentStatus::Paid, created),
            enrollment("55555555555", PaymentStatus::Paid, created),
        ];
        let mut expected: Vec<EnrollmentId> = enrollments.iter().map(|e| e.id).collect();
        expected.sort_by(|a, b| a.0.cmp(&b.0));

        let view = dashboard(&enrollments, &[], EnrollmentFilter::All, Money::from_cents(8_000));
        let ids: Vec<EnrollmentId> = view.entries.iter().map(|e| e.enrollment.id).collect();
        assert_eq!(ids, expected);
    }
}
