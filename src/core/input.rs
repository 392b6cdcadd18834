//! Turns raw form text into validated loan values.
//!
//! Loan fields are strict: anything that does not parse to an in-range number is an
//! `InvalidInput` error. Prepayment cells are lenient: blank or unparseable text counts as no
//! prepayment, matching how an untouched table cell behaves.

use super::error::LoanError;
use super::types::{MAX_TENURE_YEARS, PrepaymentEntry};

pub fn parse_number(field: &'static str, raw: &str) -> Result<f64, LoanError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LoanError::invalid(field, "is required"));
    }
    let value = trimmed
        .parse::<f64>()
        .map_err(|_| LoanError::invalid(field, format!("'{trimmed}' is not a number")))?;
    if !value.is_finite() {
        return Err(LoanError::invalid(field, "must be a finite number"));
    }
    Ok(value)
}

pub fn parse_principal(raw: &str) -> Result<f64, LoanError> {
    check_principal(parse_number("principal", raw)?)
}

pub fn parse_annual_rate(raw: &str) -> Result<f64, LoanError> {
    check_annual_rate(parse_number("annual rate", raw)?)
}

pub fn parse_tenure_years(raw: &str) -> Result<u32, LoanError> {
    check_tenure_years(parse_number("tenure", raw)?)
}

pub fn check_principal(value: f64) -> Result<f64, LoanError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(LoanError::invalid("principal", "must be > 0"));
    }
    Ok(value)
}

pub fn check_annual_rate(value: f64) -> Result<f64, LoanError> {
    if !value.is_finite() || value < 0.0 {
        return Err(LoanError::invalid("annual rate", "must be >= 0"));
    }
    Ok(value)
}

pub fn check_tenure_years(value: f64) -> Result<u32, LoanError> {
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(LoanError::invalid("tenure", "must be a whole number of years"));
    }
    if value < 1.0 || value > f64::from(MAX_TENURE_YEARS) {
        return Err(LoanError::invalid(
            "tenure",
            format!("must be between 1 and {MAX_TENURE_YEARS} years"),
        ));
    }
    Ok(value as u32)
}

pub fn coerce_prepayment(raw: &str) -> Result<f64, LoanError> {
    match raw.trim().parse::<f64>() {
        Ok(value) => check_prepayment(value),
        Err(_) => Ok(0.0),
    }
}

pub fn check_prepayment(value: f64) -> Result<f64, LoanError> {
    if value.is_nan() {
        return Ok(0.0);
    }
    if !value.is_finite() || value < 0.0 {
        return Err(LoanError::invalid("prepayment", "must be >= 0"));
    }
    Ok(value)
}

/// Parses `MONTH=AMOUNT`.
pub fn parse_prepayment_entry(raw: &str) -> Result<PrepaymentEntry, LoanError> {
    let Some((month, amount)) = raw.split_once('=') else {
        return Err(LoanError::invalid(
            "prepayment",
            format!("'{raw}' must look like MONTH=AMOUNT"),
        ));
    };
    let month = month
        .trim()
        .parse::<u32>()
        .map_err(|_| LoanError::invalid("prepayment", format!("'{month}' is not a month number")))?;
    let amount = check_prepayment(parse_number("prepayment", amount)?)?;
    Ok(PrepaymentEntry { month, amount })
}

/// Parses a comma-separated list of `MONTH=AMOUNT` entries; blank input is an empty list.
pub fn parse_prepayment_list(raw: &str) -> Result<Vec<PrepaymentEntry>, LoanError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_prepayment_entry)
        .collect()
}
