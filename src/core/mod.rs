mod engine;
mod error;
mod input;
mod types;

pub use engine::{
    SETTLEMENT_TOLERANCE, apply_prepayment, apply_prepayments, compute_emi, generate_schedule,
    summarize,
};
pub use error::LoanError;
pub use input::{
    check_annual_rate, check_prepayment, check_principal, check_tenure_years, coerce_prepayment,
    parse_annual_rate, parse_prepayment_entry, parse_prepayment_list, parse_principal,
    parse_tenure_years,
};
pub use types::{
    LedgerRow, LoanParameters, MAX_TENURE_YEARS, PrepaymentEntry, PrepaymentMode, Schedule,
    ScheduleState, ScheduleSummary,
};
