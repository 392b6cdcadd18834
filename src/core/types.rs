use serde::Serialize;

use super::error::LoanError;
use super::input::{check_annual_rate, check_principal};

/// Longest tenure accepted; bounds a schedule at 1200 rows.
pub const MAX_TENURE_YEARS: u32 = 100;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrepaymentMode {
    /// Later rows keep their principal/interest split; only the balance reduction carries.
    #[default]
    CarryForward,
    /// Later rows are re-split from the reduced balance and the loan may clear early.
    Reamortize,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanParameters {
    principal: f64,
    annual_rate_percent: f64,
    tenure_years: u32,
}

impl LoanParameters {
    pub fn new(
        principal: f64,
        annual_rate_percent: f64,
        tenure_years: u32,
    ) -> Result<Self, LoanError> {
        let principal = check_principal(principal)?;
        let annual_rate_percent = check_annual_rate(annual_rate_percent)?;
        if tenure_years == 0 || tenure_years > MAX_TENURE_YEARS {
            return Err(LoanError::invalid(
                "tenure",
                format!("must be between 1 and {MAX_TENURE_YEARS} years"),
            ));
        }
        Ok(Self {
            principal,
            annual_rate_percent,
            tenure_years,
        })
    }

    pub fn principal(&self) -> f64 {
        self.principal
    }

    pub fn annual_rate_percent(&self) -> f64 {
        self.annual_rate_percent
    }

    pub fn tenure_years(&self) -> u32 {
        self.tenure_years
    }

    pub fn monthly_rate(&self) -> f64 {
        self.annual_rate_percent / 12.0 / 100.0
    }

    pub fn total_months(&self) -> u32 {
        self.tenure_years * 12
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRow {
    pub month: u32,
    pub emi: f64,
    pub principal_portion: f64,
    pub interest_portion: f64,
    pub outstanding_balance: f64,
    pub prepayment: f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PrepaymentEntry {
    pub month: u32,
    pub amount: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ScheduleState {
    Uninitialized,
    Populated,
}

/// One calculation's ledger. `Schedule::default()` is the empty, not-yet-calculated state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schedule {
    pub(crate) parameters: Option<LoanParameters>,
    pub(crate) emi: f64,
    pub(crate) mode: PrepaymentMode,
    pub(crate) rows: Vec<LedgerRow>,
}

impl Schedule {
    pub fn with_mode(mut self, mode: PrepaymentMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn state(&self) -> ScheduleState {
        if self.rows.is_empty() {
            ScheduleState::Uninitialized
        } else {
            ScheduleState::Populated
        }
    }

    pub fn parameters(&self) -> Option<&LoanParameters> {
        self.parameters.as_ref()
    }

    pub fn emi(&self) -> f64 {
        self.emi
    }

    pub fn mode(&self) -> PrepaymentMode {
        self.mode
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    pub fn row(&self, month: u32) -> Option<&LedgerRow> {
        let index = usize::try_from(month).ok()?.checked_sub(1)?;
        self.rows.get(index)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub emi: f64,
    pub total_months: u32,
    pub total_interest: f64,
    pub total_prepayment: f64,
    pub total_paid: f64,
    pub payoff_month: Option<u32>,
}
