// 🏦 Loan Amortizer - fixed-rate, equal monthly payments
//
// The financed part of a purchase is repaid as an annuity over the horizon.
// Only the interest is a cost in the TCO: the principal itself is already
// counted through depreciation and the downpayment.

use crate::coerce::non_negative;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Amortization {
    pub principal: f64,
    pub months: u32,
    pub monthly_payment: f64,
    pub total_paid: f64,
    pub total_interest: f64,
}

fn term_months(term_years: f64) -> u32 {
    let months = (non_negative(term_years) * 12.0).round();
    (months as u32).max(1)
}

/// Amortize `principal` at `annual_rate_pct` over `term_years`.
///
/// Non-positive principal owes nothing; negative rates count as 0 and a
/// zero-rate loan repays exactly the principal.
pub fn amortize(principal: f64, annual_rate_pct: f64, term_years: f64) -> Amortization {
    let principal = non_negative(principal);
    let months = term_months(term_years);

    if principal <= 0.0 {
        return Amortization {
            months,
            ..Amortization::default()
        };
    }

    let rate = non_negative(annual_rate_pct) / 100.0 / 12.0;
    let n = months as f64;

    let monthly_payment = if rate <= 0.0 {
        principal / n
    } else {
        principal * rate / (1.0 - (1.0 + rate).powf(-n))
    };

    let total_paid = if rate <= 0.0 {
        principal
    } else {
        monthly_payment * n
    };

    Amortization {
        principal,
        months,
        monthly_payment,
        total_paid,
        total_interest: total_paid - principal,
    }
}

/// Finance a purchase: the loan covers `purchase_price - downpayment`
pub fn finance(purchase_price: f64, downpayment: f64, annual_rate_pct: f64, term_years: f64) -> Amortization {
    let principal = (non_negative(purchase_price) - non_negative(downpayment)).max(0.0);
    amortize(principal, annual_rate_pct, term_years)
}

// ============================================================================
// SCHEDULE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScheduleRow {
    /// 1-based month number
    pub month: u32,
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
    pub balance: f64,
}

/// Month-by-month breakdown of [`amortize`]. Empty when nothing is owed.
pub fn schedule(principal: f64, annual_rate_pct: f64, term_years: f64) -> Vec<ScheduleRow> {
    let plan = amortize(principal, annual_rate_pct, term_years);
    if plan.principal <= 0.0 {
        return Vec::new();
    }

    let rate = non_negative(annual_rate_pct) / 100.0 / 12.0;
    let mut balance = plan.principal;
    let mut rows = Vec::with_capacity(plan.months as usize);

    for month in 1..=plan.months {
        let interest = balance * rate;
        // Last payment absorbs floating-point drift
        let principal_part = if month == plan.months {
            balance
        } else {
            plan.monthly_payment - interest
        };
        balance -= principal_part;

        rows.push(ScheduleRow {
            month,
            payment: principal_part + interest,
            interest,
            principal: principal_part,
            balance: balance.max(0.0),
        });
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_rate_loan() {
        let plan = finance(100_000.0, 0.0, 0.0, 5.0);
        assert_eq!(plan.total_paid, 100_000.0);
        assert_eq!(plan.total_interest, 0.0);
        assert_eq!(plan.months, 60);
    }

    #[test]
    fn test_negative_rate_treated_as_zero() {
        let plan = amortize(50_000.0, -3.0, 3.0);
        assert_eq!(plan.total_interest, 0.0);
        assert_eq!(plan.total_paid, 50_000.0);
    }

    #[test]
    fn test_standard_annuity() {
        // 200 000 at 5 % over 5 years: 3 774.25 / month
        let plan = amortize(200_000.0, 5.0, 5.0);
        assert!((plan.monthly_payment - 3774.25).abs() < 0.01, "got {}", plan.monthly_payment);
        assert!((plan.total_interest - 26_454.9).abs() < 1.0, "got {}", plan.total_interest);
    }

    #[test]
    fn test_nothing_owed() {
        let plan = finance(300_000.0, 350_000.0, 6.0, 8.0);
        assert_eq!(plan.principal, 0.0);
        assert_eq!(plan.total_paid, 0.0);
        assert_eq!(plan.total_interest, 0.0);
    }

    #[test]
    fn test_interest_monotonic_in_rate() {
        let mut last = -1.0;
        for step in 0..40 {
            let rate = step as f64 * 0.5;
            let interest = amortize(250_000.0, rate, 8.0).total_interest;
            assert!(interest >= last, "rate {} decreased interest", rate);
            last = interest;
        }
    }

    #[test]
    fn test_interest_monotonic_in_downpayment() {
        let mut last = f64::INFINITY;
        for step in 0..=12 {
            let down = step as f64 * 25_000.0;
            let interest = finance(300_000.0, down, 4.5, 5.0).total_interest;
            assert!(interest <= last, "downpayment {} increased interest", down);
            last = interest;
        }
        assert_eq!(last, 0.0);
    }

    #[test]
    fn test_schedule_sums_match_amortize() {
        let plan = amortize(120_000.0, 6.0, 3.0);
        let rows = schedule(120_000.0, 6.0, 3.0);

        assert_eq!(rows.len(), 36);
        let interest: f64 = rows.iter().map(|r| r.interest).sum();
        let principal: f64 = rows.iter().map(|r| r.principal).sum();

        assert!((interest - plan.total_interest).abs() < 0.01);
        assert!((principal - 120_000.0).abs() < 1e-6);
        assert_eq!(rows.last().map(|r| r.balance), Some(0.0));
    }

    #[test]
    fn test_schedule_empty_without_principal() {
        assert!(schedule(0.0, 5.0, 5.0).is_empty());
    }
}
