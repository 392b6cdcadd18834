use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoanError {
    #[error("Invalid input: {field} {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("Month {month} is outside the schedule (1..={total_months})")]
    MonthOutOfRange { month: u32, total_months: u32 },

    #[error("No schedule has been calculated yet")]
    NotCalculated,

    #[error(
        "Prepayment of {amount:.2} in month {month} exceeds the outstanding balance of {balance:.2}"
    )]
    PrepaymentExceedsBalance { month: u32, amount: f64, balance: f64 },

    #[error("Monthly installment is not a finite number for these loan parameters")]
    NonFiniteInstallment,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl LoanError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        LoanError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for LoanError {
    fn from(e: serde_json::Error) -> Self {
        LoanError::Serialization(e.to_string())
    }
}
