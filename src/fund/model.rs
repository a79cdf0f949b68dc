use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A roster member in the current (cumulative) shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    pub name: String,
    pub total_paid: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_payment_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satisfaction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// The superseded roster shape: a paid flag and a single payment date.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyPerson {
    pub id: String,
    pub name: String,
    pub has_paid: bool,
    pub date_paid: Option<String>,
    pub satisfaction: Option<String>,
    pub note: Option<String>,
}

/// A person exactly as found in storage. Only `migrate::migrate_person`
/// turns this into a [`Person`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawPerson")]
pub enum PersonRecord {
    Current(Person),
    Legacy(LegacyPerson),
}

impl From<Person> for PersonRecord {
    fn from(person: Person) -> Self {
        PersonRecord::Current(person)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPerson {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    total_paid: Option<f64>,
    #[serde(default)]
    last_payment_date: Option<String>,
    #[serde(default)]
    has_paid: Option<bool>,
    #[serde(default)]
    date_paid: Option<String>,
    #[serde(default)]
    satisfaction: Option<String>,
    #[serde(default)]
    note: Option<String>,
}

impl From<RawPerson> for PersonRecord {
    fn from(raw: RawPerson) -> Self {
        match raw.total_paid {
            Some(total_paid) => PersonRecord::Current(Person {
                id: raw.id,
                name: raw.name,
                total_paid,
                last_payment_date: raw.last_payment_date,
                satisfaction: raw.satisfaction,
                note: raw.note,
            }),
            None => PersonRecord::Legacy(LegacyPerson {
                id: raw.id,
                name: raw.name,
                has_paid: raw.has_paid.unwrap_or(false),
                date_paid: raw.date_paid.or(raw.last_payment_date),
                satisfaction: raw.satisfaction,
                note: raw.note,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub date: String,
}

/// A ledger document normalized from either stored shape: the wrapped
/// `{people, expenses, lastUpdated}` object or a bare person array.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "StoredDocument")]
pub struct LedgerDocument {
    pub people: Vec<PersonRecord>,
    pub expenses: Vec<Expense>,
    pub last_updated: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredDocument {
    Roster(Vec<PersonRecord>),
    Wrapped(WrappedDocument),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WrappedDocument {
    #[serde(default)]
    people: Option<Vec<PersonRecord>>,
    #[serde(default)]
    expenses: Option<Vec<Expense>>,
    #[serde(default)]
    last_updated: Option<String>,
}

impl From<StoredDocument> for LedgerDocument {
    fn from(stored: StoredDocument) -> Self {
        match stored {
            StoredDocument::Roster(people) => LedgerDocument {
                people,
                expenses: Vec::new(),
                last_updated: None,
            },
            StoredDocument::Wrapped(doc) => LedgerDocument {
                people: doc.people.unwrap_or_default(),
                expenses: doc.expenses.unwrap_or_default(),
                last_updated: doc.last_updated,
            },
        }
    }
}

impl LedgerDocument {
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("ledger document is not a roster array or ledger object")
    }

    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .context("ledger document is not a roster array or ledger object")
    }
}

/// The unit of persistence and transmission. Always written wrapped.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    pub people: Vec<Person>,
    pub expenses: Vec<Expense>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl LedgerSnapshot {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
