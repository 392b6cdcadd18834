use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use serde::Serialize;
use simple_logger::SimpleLogger;
use std::fmt::Write as _;
use std::net::IpAddr;

use crate::core::{
    LedgerRow, LoanError, LoanParameters, PrepaymentEntry, PrepaymentMode, Schedule,
    ScheduleSummary, apply_prepayments, generate_schedule, parse_prepayment_entry, summarize,
};

#[derive(Parser, Debug)]
#[command(
    name = "homeloan",
    version,
    about = "Home loan EMI calculator with an editable amortization schedule"
)]
pub struct Cli {
    #[arg(long, global = true, default_value = "info")]
    pub log_level: LevelFilter,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the calculator page and JSON API.
    Serve(ServeArgs),
    /// Print the amortization schedule for one loan.
    Schedule(ScheduleArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: IpAddr,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliPrepaymentMode {
    CarryForward,
    Reamortize,
}

impl From<CliPrepaymentMode> for PrepaymentMode {
    fn from(value: CliPrepaymentMode) -> Self {
        match value {
            CliPrepaymentMode::CarryForward => PrepaymentMode::CarryForward,
            CliPrepaymentMode::Reamortize => PrepaymentMode::Reamortize,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    #[arg(long, help = "Loan amount")]
    pub principal: f64,
    #[arg(long, help = "Annual interest rate in percent, e.g. 8.5")]
    pub rate: f64,
    #[arg(long, help = "Tenure in whole years")]
    pub tenure: u32,
    #[arg(
        long = "prepay",
        value_name = "MONTH=AMOUNT",
        value_parser = parse_prepayment_entry,
        help = "Extra payment in a given month; repeatable"
    )]
    pub prepayments: Vec<PrepaymentEntry>,
    #[arg(long, value_enum, default_value_t = CliPrepaymentMode::CarryForward)]
    pub mode: CliPrepaymentMode,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleReport<'a> {
    parameters: LoanParameters,
    mode: PrepaymentMode,
    summary: ScheduleSummary,
    rows: &'a [LedgerRow],
}

pub fn init_logging(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    SimpleLogger::new().with_level(level).init()
}

pub fn build_schedule(args: &ScheduleArgs) -> Result<Schedule, LoanError> {
    let parameters = LoanParameters::new(args.principal, args.rate, args.tenure)?;
    let mut schedule = generate_schedule(&parameters)?.with_mode(args.mode.into());
    apply_prepayments(&mut schedule, &args.prepayments)?;
    Ok(schedule)
}

pub fn run_schedule(args: &ScheduleArgs) -> Result<String, LoanError> {
    let schedule = build_schedule(args)?;
    match args.format {
        OutputFormat::Table => Ok(render_table(&schedule)),
        OutputFormat::Json => render_json(&schedule),
    }
}

fn render_json(schedule: &Schedule) -> Result<String, LoanError> {
    let parameters = *schedule.parameters().ok_or(LoanError::NotCalculated)?;
    let report = ScheduleReport {
        parameters,
        mode: schedule.mode(),
        summary: summarize(schedule),
        rows: schedule.rows(),
    };
    let mut json = serde_json::to_string_pretty(&report)?;
    json.push('\n');
    Ok(json)
}

const HEADERS: [&str; 6] = [
    "Month",
    "EMI",
    "Principal",
    "Interest",
    "Outstanding Balance",
    "Prepayment",
];

pub fn render_table(schedule: &Schedule) -> String {
    let cells: Vec<[String; 6]> = schedule.rows().iter().map(row_cells).collect();
    let mut widths = HEADERS.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &HEADERS.map(String::from), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));
    for row in &cells {
        push_line(&mut out, row, &widths);
    }

    let summary = summarize(schedule);
    let _ = writeln!(out);
    let _ = writeln!(out, "EMI:              {:.2}", summary.emi);
    let _ = writeln!(out, "Total interest:   {:.2}", summary.total_interest);
    let _ = writeln!(out, "Total prepayment: {:.2}", summary.total_prepayment);
    let _ = writeln!(out, "Total paid:       {:.2}", summary.total_paid);
    match summary.payoff_month {
        Some(month) => {
            let _ = writeln!(out, "Paid off in month {month} of {}", summary.total_months);
        }
        None => {
            let _ = writeln!(out, "Not paid off within {} months", summary.total_months);
        }
    }
    out
}

fn row_cells(row: &LedgerRow) -> [String; 6] {
    [
        row.month.to_string(),
        money(row.emi),
        money(row.principal_portion),
        money(row.interest_portion),
        money(row.outstanding_balance),
        money(row.prepayment),
    ]
}

// Rounds away negative zero so a settled balance prints as 0.00.
fn money(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    format!("{:.2}", if rounded == 0.0 { 0.0 } else { rounded })
}

fn push_line(out: &mut String, cells: &[String; 6], widths: &[usize; 6]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:>width$}"))
        .collect();
    let _ = writeln!(out, "{}", padded.join(" | "));
}
