use crate::error::FundError;
use crate::fund::model::{Expense, LedgerSnapshot, Person};
use crate::fund::util::{new_id, now_iso8601};
use serde::Serialize;

/// Derived figures for a snapshot. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_people: usize,
    pub contributors_count: usize,
    pub zero_contribution_count: usize,
    pub total_collected: f64,
    pub total_spent: f64,
    pub remaining_balance: f64,
}

impl Stats {
    pub fn from_snapshot(snapshot: &LedgerSnapshot) -> Self {
        let total_collected: f64 = snapshot.people.iter().map(|p| p.total_paid).sum();
        let total_spent: f64 = snapshot.expenses.iter().map(|e| e.amount).sum();
        let contributors_count = snapshot
            .people
            .iter()
            .filter(|p| p.total_paid > 0.0)
            .count();
        Self {
            total_people: snapshot.people.len(),
            contributors_count,
            zero_contribution_count: snapshot.people.len() - contributors_count,
            total_collected,
            total_spent,
            remaining_balance: total_collected - total_spent,
        }
    }
}

/// People who have not contributed anything yet, in roster order.
pub fn zero_contributors(snapshot: &LedgerSnapshot) -> Vec<&Person> {
    snapshot
        .people
        .iter()
        .filter(|p| p.total_paid <= 0.0)
        .collect()
}

/// Contributors, largest total first.
pub fn top_contributors(snapshot: &LedgerSnapshot) -> Vec<&Person> {
    let mut out: Vec<&Person> = snapshot
        .people
        .iter()
        .filter(|p| p.total_paid > 0.0)
        .collect();
    out.sort_by(|a, b| b.total_paid.total_cmp(&a.total_paid));
    out
}

/// A pending ledger change. Applying it rebuilds the snapshot; records are
/// replaced by id as whole values.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerOp {
    AddPerson { name: String },
    AddPayment { id: String, amount: f64 },
    RatePerson { id: String, feedback: String },
    RemovePerson { id: String },
    AddExpense { description: String, amount: f64 },
    RemoveExpense { id: String },
}

/// What an applied op produced, for reporting back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Person(Person),
    Expense(Expense),
    Removed { id: String },
}

impl LedgerOp {
    pub fn label(&self) -> &'static str {
        match self {
            LedgerOp::AddPerson { .. } => "add-person",
            LedgerOp::AddPayment { .. } => "add-payment",
            LedgerOp::RatePerson { .. } => "rate-person",
            LedgerOp::RemovePerson { .. } => "remove-person",
            LedgerOp::AddExpense { .. } => "add-expense",
            LedgerOp::RemoveExpense { .. } => "remove-expense",
        }
    }

    /// Build the next snapshot. `current` is left untouched; on error no
    /// snapshot is produced.
    pub fn apply(&self, current: &LedgerSnapshot) -> Result<(LedgerSnapshot, Applied), FundError> {
        let mut next = current.clone();
        let applied = match self {
            LedgerOp::AddPerson { name } => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(FundError::EmptyName);
                }
                let person = Person {
                    id: new_id(),
                    name: name.to_string(),
                    total_paid: 0.0,
                    last_payment_date: None,
                    satisfaction: None,
                    note: None,
                };
                next.people.push(person.clone());
                Applied::Person(person)
            }
            LedgerOp::AddPayment { id, amount } => {
                if !amount.is_finite() {
                    return Err(FundError::InvalidAmount(*amount));
                }
                if *amount <= 0.0 {
                    return Err(FundError::NonPositivePayment(*amount));
                }
                let updated = replace_person(&mut next, id, |p| Person {
                    total_paid: p.total_paid + amount,
                    last_payment_date: Some(now_iso8601()),
                    ..p.clone()
                })?;
                Applied::Person(updated)
            }
            LedgerOp::RatePerson { id, feedback } => {
                let feedback = feedback.trim();
                let updated = replace_person(&mut next, id, |p| Person {
                    satisfaction: (!feedback.is_empty()).then(|| feedback.to_string()),
                    ..p.clone()
                })?;
                Applied::Person(updated)
            }
            LedgerOp::RemovePerson { id } => {
                let before = next.people.len();
                next.people.retain(|p| p.id != *id);
                if next.people.len() == before {
                    return Err(FundError::UnknownPerson(id.clone()));
                }
                Applied::Removed { id: id.clone() }
            }
            LedgerOp::AddExpense {
                description,
                amount,
            } => {
                let description = description.trim();
                if description.is_empty() {
                    return Err(FundError::EmptyDescription);
                }
                if !amount.is_finite() {
                    return Err(FundError::InvalidAmount(*amount));
                }
                let expense = Expense {
                    id: new_id(),
                    description: description.to_string(),
                    amount: *amount,
                    date: now_iso8601(),
                };
                next.expenses.push(expense.clone());
                Applied::Expense(expense)
            }
            LedgerOp::RemoveExpense { id } => {
                let before = next.expenses.len();
                next.expenses.retain(|e| e.id != *id);
                if next.expenses.len() == before {
                    return Err(FundError::UnknownExpense(id.clone()));
                }
                Applied::Removed { id: id.clone() }
            }
        };
        next.last_updated = Some(now_iso8601());
        Ok((next, applied))
    }
}

fn replace_person(
    snapshot: &mut LedgerSnapshot,
    id: &str,
    update: impl FnOnce(&Person) -> Person,
) -> Result<Person, FundError> {
    let slot = snapshot
        .people
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| FundError::UnknownPerson(id.to_string()))?;
    *slot = update(&*slot);
    Ok(slot.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: &str, total_paid: f64) -> Person {
        Person {
            id: id.into(),
            name: format!("person-{id}"),
            total_paid,
            last_payment_date: None,
            satisfaction: None,
            note: None,
        }
    }

    fn find<'a>(snapshot: &'a LedgerSnapshot, id: &str) -> Option<&'a Person> {
        snapshot.people.iter().find(|p| p.id == id)
    }

    fn expense(amount: f64) -> Expense {
        Expense {
            id: new_id(),
            description: "beans".into(),
            amount,
            date: "2024-03-01T09:30:00.000Z".into(),
        }
    }

    #[test]
    fn stats_follow_roster_and_expenses() {
        let snapshot = LedgerSnapshot {
            people: vec![person("a", 0.0), person("b", 50.0), person("c", 100.0)],
            expenses: vec![expense(10.0), expense(20.0)],
            last_updated: None,
        };
        let stats = Stats::from_snapshot(&snapshot);
        assert_eq!(stats.total_people, 3);
        assert_eq!(stats.total_collected, 150.0);
        assert_eq!(stats.total_spent, 30.0);
        assert_eq!(stats.remaining_balance, 120.0);
        assert_eq!(stats.zero_contribution_count, 1);
        assert_eq!(stats.contributors_count, 2);
    }

    #[test]
    fn empty_ledger_has_zero_stats() {
        assert_eq!(Stats::from_snapshot(&LedgerSnapshot::default()), Stats::default());
    }

    #[test]
    fn add_person_trims_and_starts_at_zero() {
        let (next, applied) = LedgerOp::AddPerson {
            name: "  Ayşe ".into(),
        }
        .apply(&LedgerSnapshot::default())
        .expect("apply");
        let Applied::Person(added) = applied else {
            panic!("expected person");
        };
        assert_eq!(added.name, "Ayşe");
        assert_eq!(added.total_paid, 0.0);
        assert!(added.last_payment_date.is_none());
        assert_eq!(next.people, vec![added]);
        assert!(next.last_updated.is_some());
    }

    #[test]
    fn blank_names_and_descriptions_are_rejected() {
        let empty = LedgerSnapshot::default();
        assert_eq!(
            LedgerOp::AddPerson { name: "   ".into() }.apply(&empty),
            Err(FundError::EmptyName)
        );
        assert_eq!(
            LedgerOp::AddExpense {
                description: "\t".into(),
                amount: 12.0
            }
            .apply(&empty),
            Err(FundError::EmptyDescription)
        );
    }

    #[test]
    fn payments_accumulate_and_stamp_date() {
        let start = LedgerSnapshot {
            people: vec![person("a", 50.0)],
            ..LedgerSnapshot::default()
        };
        let (next, _) = LedgerOp::AddPayment {
            id: "a".into(),
            amount: 25.0,
        }
        .apply(&start)
        .expect("apply");
        let updated = find(&next, "a").expect("person");
        assert_eq!(updated.total_paid, 75.0);
        assert!(updated.last_payment_date.is_some());
        assert_eq!(start.people[0].total_paid, 50.0);
    }

    #[test]
    fn non_positive_or_unknown_payments_fail() {
        let start = LedgerSnapshot {
            people: vec![person("a", 0.0)],
            ..LedgerSnapshot::default()
        };
        assert_eq!(
            LedgerOp::AddPayment { id: "a".into(), amount: 0.0 }.apply(&start),
            Err(FundError::NonPositivePayment(0.0))
        );
        assert!(matches!(
            LedgerOp::AddPayment { id: "a".into(), amount: f64::NAN }.apply(&start),
            Err(FundError::InvalidAmount(_))
        ));
        assert_eq!(
            LedgerOp::AddPayment { id: "zz".into(), amount: 5.0 }.apply(&start),
            Err(FundError::UnknownPerson("zz".into()))
        );
    }

    #[test]
    fn rating_sets_and_clears_feedback() {
        let start = LedgerSnapshot {
            people: vec![person("a", 0.0)],
            ..LedgerSnapshot::default()
        };
        let (rated, _) = LedgerOp::RatePerson {
            id: "a".into(),
            feedback: " too strong ".into(),
        }
        .apply(&start)
        .expect("rate");
        assert_eq!(
            find(&rated, "a").and_then(|p| p.satisfaction.as_deref()),
            Some("too strong")
        );
        let (cleared, _) = LedgerOp::RatePerson {
            id: "a".into(),
            feedback: String::new(),
        }
        .apply(&rated)
        .expect("clear");
        assert!(find(&cleared, "a").expect("person").satisfaction.is_none());
    }

    #[test]
    fn removal_filters_by_id() {
        let start = LedgerSnapshot {
            people: vec![person("a", 0.0), person("b", 10.0)],
            expenses: vec![expense(5.0)],
            last_updated: None,
        };
        let expense_id = start.expenses[0].id.clone();
        let (next, _) = LedgerOp::RemovePerson { id: "a".into() }
            .apply(&start)
            .expect("remove person");
        assert_eq!(next.people.len(), 1);
        assert_eq!(next.people[0].id, "b");
        let (next, _) = LedgerOp::RemoveExpense { id: expense_id }
            .apply(&next)
            .expect("remove expense");
        assert!(next.expenses.is_empty());
        assert_eq!(
            LedgerOp::RemoveExpense { id: "nope".into() }.apply(&next),
            Err(FundError::UnknownExpense("nope".into()))
        );
    }

    #[test]
    fn contributors_are_split_and_ranked() {
        let snapshot = LedgerSnapshot {
            people: vec![person("a", 0.0), person("b", 50.0), person("c", 100.0)],
            ..LedgerSnapshot::default()
        };
        let zero: Vec<&str> = zero_contributors(&snapshot).iter().map(|p| p.id.as_str()).collect();
        let top: Vec<&str> = top_contributors(&snapshot).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(zero, vec!["a"]);
        assert_eq!(top, vec!["c", "b"]);
    }
}
