// crates/chitfund-cli/src/output.rs
//
// Output formatting utilities for the chitfund CLI.
// Supports table and JSON output modes.

use serde::Serialize;
use tabled::{Table, Tabled};

use chitfund_core::fund::{Fund, WinnerRecord};
use chitfund_core::member::Member;
use chitfund_core::user::UserSummary;
use chitfund_engine::{LedgerEntry, ScheduleRow};

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed table output (default).
    Table,
    /// JSON output for machine consumption.
    Json,
}

/// Format a slice of Tabled items as a table string.
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    Table::new(data).to_string()
}

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

/// Print `value` as JSON, or the rows built from it as a table.
pub fn emit<T, R, F>(format: OutputFormat, value: &T, rows: F)
where
    T: Serialize,
    R: Tabled,
    F: FnOnce(&T) -> Vec<R>,
{
    match format {
        OutputFormat::Json => println!("{}", format_json(value)),
        OutputFormat::Table => {
            let rows = rows(value);
            if rows.is_empty() {
                println!("(none)");
            } else {
                println!("{}", format_table(&rows));
            }
        }
    }
}

/// Rupee amount with Indian digit grouping: 2500000 -> "₹25,00,000".
pub fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    if digits.len() <= 3 {
        return format!("₹{}", digits);
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 2 {
        groups.push(&head[end - 2..end]);
        end -= 2;
    }
    groups.push(&head[..end]);
    groups.reverse();
    format!("₹{},{}", groups.join(","), tail)
}

// ---------------------------------------------------------------------------
// Table rows
// ---------------------------------------------------------------------------

#[derive(Tabled)]
pub struct MemberRow {
    #[tabled(rename = "Member ID")]
    pub member_id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Mobile")]
    pub mobile: String,
    #[tabled(rename = "Email")]
    pub email: String,
    #[tabled(rename = "Location")]
    pub location: String,
}

impl From<&Member> for MemberRow {
    fn from(m: &Member) -> Self {
        Self {
            member_id: m.member_id.clone(),
            name: m.name.clone(),
            mobile: m.mobile.clone(),
            email: m.email.clone(),
            location: m.location.clone(),
        }
    }
}

#[derive(Tabled)]
pub struct FundRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Members")]
    pub members: String,
    #[tabled(rename = "Monthly")]
    pub monthly: String,
    #[tabled(rename = "Draw Day")]
    pub draw_day: u8,
    #[tabled(rename = "Winners")]
    pub winners: usize,
}

impl From<&Fund> for FundRow {
    fn from(f: &Fund) -> Self {
        Self {
            id: f.id.to_string(),
            name: f.name.clone(),
            members: format!("{}/{}", f.active_members.len(), f.total_members),
            monthly: format_amount(f.monthly_amount),
            draw_day: f.draw_day,
            winners: f.winner_history.len(),
        }
    }
}

#[derive(Tabled)]
pub struct WinnerRow {
    #[tabled(rename = "Member ID")]
    pub member_id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Date Won")]
    pub date_won: String,
    #[tabled(rename = "Amount")]
    pub amount: String,
}

impl From<&WinnerRecord> for WinnerRow {
    fn from(w: &WinnerRecord) -> Self {
        Self {
            member_id: w.member_id.clone(),
            name: w.member_name.clone(),
            date_won: w.date_won.format("%Y-%m-%d").to_string(),
            amount: format_amount(w.amount),
        }
    }
}

#[derive(Tabled)]
pub struct ScheduleTableRow {
    #[tabled(rename = "Round")]
    pub round: u32,
    #[tabled(rename = "Winners Total")]
    pub winners_amount: String,
    #[tabled(rename = "Remaining")]
    pub remaining_amount: String,
    #[tabled(rename = "Participants")]
    pub participants: u32,
    #[tabled(rename = "Share Each")]
    pub share: String,
    #[tabled(rename = "Status")]
    pub status: String,
}

impl From<&ScheduleRow> for ScheduleTableRow {
    fn from(r: &ScheduleRow) -> Self {
        Self {
            round: r.round,
            winners_amount: format_amount(r.winners_amount),
            remaining_amount: format_amount(r.remaining_amount),
            participants: r.remaining_participants,
            share: format_amount(r.per_participant_share),
            status: format!("{:?}", r.status).to_lowercase(),
        }
    }
}

#[derive(Tabled)]
pub struct LedgerRow {
    #[tabled(rename = "Fund")]
    pub fund: String,
    #[tabled(rename = "Member ID")]
    pub member_id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Date Won")]
    pub date_won: String,
    #[tabled(rename = "Amount")]
    pub amount: String,
}

impl From<&LedgerEntry> for LedgerRow {
    fn from(e: &LedgerEntry) -> Self {
        Self {
            fund: e.fund_name.clone(),
            member_id: e.member_id.clone(),
            name: e.member_name.clone(),
            date_won: e.date_won.format("%Y-%m-%d").to_string(),
            amount: format_amount(e.amount),
        }
    }
}

#[derive(Tabled)]
pub struct UserRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Username")]
    pub username: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Role")]
    pub role: String,
}

impl From<&UserSummary> for UserRow {
    fn from(u: &UserSummary) -> Self {
        Self {
            id: u.id.to_string(),
            username: u.username.clone(),
            name: u.name.clone(),
            role: u.role.as_str().to_string(),
        }
    }
}
