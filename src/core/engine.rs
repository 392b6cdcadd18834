use log::{debug, trace};

use super::error::LoanError;
use super::types::{
    LedgerRow, LoanParameters, PrepaymentEntry, PrepaymentMode, Schedule, ScheduleState,
    ScheduleSummary,
};

/// Half a cent. Differences below this are rounding drift, not money.
pub const SETTLEMENT_TOLERANCE: f64 = 0.005;

#[derive(Debug, Clone, Copy)]
struct Installment {
    emi: f64,
    principal: f64,
    interest: f64,
}

/// Fixed monthly installment for a fully amortizing loan.
///
/// Evaluated as `P*r / (1 - (1+r)^-n)` through `ln_1p`/`exp_m1`, which stays accurate for
/// rates near zero and tends to `P*r` instead of overflowing for large rates.
pub fn compute_emi(principal: f64, annual_rate_percent: f64, tenure_years: u32) -> f64 {
    let monthly_rate = annual_rate_percent / 12.0 / 100.0;
    let total_months = tenure_years.saturating_mul(12);
    if total_months == 0 {
        return 0.0;
    }
    let months = f64::from(total_months);
    if monthly_rate == 0.0 {
        return principal / months;
    }
    let discount_m1 = (-months * monthly_rate.ln_1p()).exp_m1();
    principal * monthly_rate / -discount_m1
}

pub fn generate_schedule(params: &LoanParameters) -> Result<Schedule, LoanError> {
    let emi = compute_emi(
        params.principal(),
        params.annual_rate_percent(),
        params.tenure_years(),
    );
    if !emi.is_finite() {
        return Err(LoanError::NonFiniteInstallment);
    }

    let total_months = params.total_months();
    let monthly_rate = params.monthly_rate();
    let mut balance = params.principal();
    let mut rows = Vec::with_capacity(total_months as usize);

    for month in 1..=total_months {
        let step = split_installment(balance, monthly_rate, emi, month == total_months);
        balance -= step.principal;
        trace!(
            "month {month}: emi {:.4}, principal {:.4}, interest {:.4}, balance {:.4}",
            step.emi, step.principal, step.interest, balance
        );
        rows.push(LedgerRow {
            month,
            emi: step.emi,
            principal_portion: step.principal,
            interest_portion: step.interest,
            outstanding_balance: balance,
            prepayment: 0.0,
        });
    }

    debug!(
        "generated {total_months}-month schedule for principal {:.2} at {}%: emi {emi:.2}",
        params.principal(),
        params.annual_rate_percent()
    );

    Ok(Schedule {
        parameters: Some(*params),
        emi,
        mode: PrepaymentMode::default(),
        rows,
    })
}

/// Records `amount` as the extra payment for `month` and recomputes every later row.
///
/// The amount is credited against the balance carried into the following month, so the
/// edited row and every row before it keep their values. Every recorded prepayment must fit
/// within its row's balance on the recomputed chain; otherwise the edit is rolled back.
pub fn apply_prepayment(schedule: &mut Schedule, month: u32, amount: f64) -> Result<(), LoanError> {
    check_entry(schedule, month, amount)?;

    let index = (month - 1) as usize;
    let snapshot = schedule.rows.clone();
    schedule.rows[index].prepayment = amount;
    debug!(
        "prepayment {amount:.2} at month {month}, recomputing {} rows ({:?})",
        schedule.rows.len() - index - 1,
        schedule.mode
    );
    recompute_from(schedule, index);

    if let Err(err) = check_within_balance(&schedule.rows) {
        schedule.rows = snapshot;
        return Err(err);
    }
    Ok(())
}

/// Records a batch of prepayments, recomputes once, and validates the resulting chain.
///
/// A later entry for the same month replaces an earlier one. On error nothing is applied.
pub fn apply_prepayments(
    schedule: &mut Schedule,
    entries: &[PrepaymentEntry],
) -> Result<(), LoanError> {
    for entry in entries {
        check_entry(schedule, entry.month, entry.amount)?;
    }
    let Some(first) = entries.iter().map(|entry| entry.month).min() else {
        return Ok(());
    };

    let snapshot = schedule.rows.clone();
    for entry in entries {
        schedule.rows[(entry.month - 1) as usize].prepayment = entry.amount;
    }
    recompute_from(schedule, (first - 1) as usize);

    if let Err(err) = check_within_balance(&schedule.rows) {
        schedule.rows = snapshot;
        return Err(err);
    }
    debug!("applied {} prepayments from month {first}", entries.len());
    Ok(())
}

pub fn summarize(schedule: &Schedule) -> ScheduleSummary {
    let mut total_interest = 0.0;
    let mut total_prepayment = 0.0;
    let mut total_paid = 0.0;
    let mut payoff_month = None;

    for row in &schedule.rows {
        total_interest += row.interest_portion;
        total_prepayment += row.prepayment;
        total_paid += row.principal_portion + row.interest_portion + row.prepayment;
        if payoff_month.is_none() && row.outstanding_balance - row.prepayment <= SETTLEMENT_TOLERANCE
        {
            payoff_month = Some(row.month);
        }
    }

    ScheduleSummary {
        emi: schedule.emi,
        total_months: schedule.rows.len() as u32,
        total_interest,
        total_prepayment,
        total_paid,
        payoff_month,
    }
}

fn check_entry(schedule: &Schedule, month: u32, amount: f64) -> Result<(), LoanError> {
    if schedule.state() == ScheduleState::Uninitialized {
        return Err(LoanError::NotCalculated);
    }
    let total_months = schedule.rows.len() as u32;
    if month == 0 || month > total_months {
        return Err(LoanError::MonthOutOfRange {
            month,
            total_months,
        });
    }
    if !amount.is_finite() || amount < 0.0 {
        return Err(LoanError::invalid("prepayment", "must be >= 0"));
    }
    Ok(())
}

fn check_within_balance(rows: &[LedgerRow]) -> Result<(), LoanError> {
    match rows
        .iter()
        .find(|row| row.prepayment > row.outstanding_balance.max(0.0) + SETTLEMENT_TOLERANCE)
    {
        Some(row) => Err(LoanError::PrepaymentExceedsBalance {
            month: row.month,
            amount: row.prepayment,
            balance: row.outstanding_balance,
        }),
        None => Ok(()),
    }
}

fn recompute_from(schedule: &mut Schedule, index: usize) {
    match schedule.mode {
        PrepaymentMode::CarryForward => carry_forward(&mut schedule.rows, index),
        PrepaymentMode::Reamortize => {
            let monthly_rate = schedule
                .parameters
                .as_ref()
                .map(LoanParameters::monthly_rate)
                .unwrap_or(0.0);
            reamortize(&mut schedule.rows, index, monthly_rate, schedule.emi);
        }
    }
}

// The final month, or any month whose scheduled principal would overshoot the balance,
// takes exactly the remaining balance.
fn split_installment(balance: f64, monthly_rate: f64, emi: f64, is_last: bool) -> Installment {
    let interest = balance * monthly_rate;
    let scheduled = emi - interest;
    let principal = if is_last || scheduled > balance {
        balance
    } else {
        scheduled
    };
    let emi = if scheduled - principal > SETTLEMENT_TOLERANCE {
        principal + interest
    } else {
        emi
    };
    Installment {
        emi,
        principal,
        interest,
    }
}

fn carry_forward(rows: &mut [LedgerRow], from: usize) {
    for j in (from + 1)..rows.len() {
        let previous = rows[j - 1];
        let row = &mut rows[j];
        row.outstanding_balance =
            previous.outstanding_balance - row.principal_portion - previous.prepayment;
    }
}

fn reamortize(rows: &mut [LedgerRow], from: usize, monthly_rate: f64, emi: f64) {
    let last = rows.len() - 1;
    for j in (from + 1)..rows.len() {
        let previous = rows[j - 1];
        let opening = (previous.outstanding_balance - previous.prepayment).max(0.0);
        let step = split_installment(opening, monthly_rate, emi, j == last);
        let row = &mut rows[j];
        row.emi = step.emi;
        row.principal_portion = step.principal;
        row.interest_portion = step.interest;
        row.outstanding_balance = opening - step.principal;
    }
}
