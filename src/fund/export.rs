use crate::fund::model::LedgerSnapshot;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

const BOM: &str = "\u{feff}";
const MISSING: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ViewMode {
    Income,
    Expense,
}

impl ViewMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Income => "income",
            ViewMode::Expense => "expense",
        }
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn local_date(raw: &str, tz: Tz) -> Option<String> {
    let parsed = DateTime::parse_from_rfc3339(raw).ok()?;
    Some(parsed.with_timezone(&tz).format("%d.%m.%Y").to_string())
}

fn row(fields: &[&str]) -> String {
    fields.iter().map(|f| quote(f)).collect::<Vec<_>>().join(",")
}

/// BOM-prefixed CSV for the people (income) or expense list.
pub fn render_csv(snapshot: &LedgerSnapshot, view: ViewMode, tz: Tz) -> String {
    let mut lines = Vec::new();
    match view {
        ViewMode::Income => {
            lines.push("Name,Total Paid,Last Payment,Note".to_string());
            for person in &snapshot.people {
                let date = person
                    .last_payment_date
                    .as_deref()
                    .and_then(|d| local_date(d, tz))
                    .unwrap_or_else(|| MISSING.to_string());
                let total = person.total_paid.to_string();
                let note = person.satisfaction.as_deref().unwrap_or(MISSING);
                lines.push(row(&[&person.name, &total, &date, note]));
            }
        }
        ViewMode::Expense => {
            lines.push("Description,Date,Amount".to_string());
            for expense in &snapshot.expenses {
                let date = local_date(&expense.date, tz).unwrap_or_else(|| MISSING.to_string());
                let amount = expense.amount.to_string();
                lines.push(row(&[&expense.description, &date, &amount]));
            }
        }
    }
    format!("{BOM}{}", lines.join("\n"))
}

pub fn default_file_name(view: ViewMode, date: NaiveDate) -> String {
    let kind = match view {
        ViewMode::Income => "INCOME",
        ViewMode::Expense => "EXPENSE",
    };
    format!("FUND_{kind}_{}.csv", date.format("%Y-%m-%d"))
}

pub fn today_file_name(view: ViewMode) -> String {
    default_file_name(view, Utc::now().date_naive())
}
