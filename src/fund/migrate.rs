//! Upgrades stored roster records to the cumulative-payment model.
//!
//! Legacy records only say *whether* someone paid, not how much. A paid
//! legacy record is credited [`DEFAULT_ASSUMED_AMOUNT`], the standard monthly
//! contribution at the time the cumulative model was introduced. This is a
//! lossy approximation: the true historical amount is unknown and is not
//! reconstructed here.

use crate::fund::model::{LedgerDocument, LedgerSnapshot, Person, PersonRecord};

/// Amount credited to a legacy record whose paid flag is set.
pub const DEFAULT_ASSUMED_AMOUNT: f64 = 200.0;

fn sanitize_total(total: f64) -> f64 {
    if total.is_finite() && total > 0.0 {
        total
    } else {
        0.0
    }
}

pub fn migrate_person(record: PersonRecord) -> Person {
    match record {
        PersonRecord::Current(person) => Person {
            total_paid: sanitize_total(person.total_paid),
            ..person
        },
        PersonRecord::Legacy(legacy) => Person {
            id: legacy.id,
            name: legacy.name,
            total_paid: if legacy.has_paid {
                DEFAULT_ASSUMED_AMOUNT
            } else {
                0.0
            },
            last_payment_date: legacy.date_paid,
            satisfaction: legacy.satisfaction,
            note: legacy.note,
        },
    }
}

pub fn migrate_people(records: Vec<PersonRecord>) -> Vec<Person> {
    records.into_iter().map(migrate_person).collect()
}

/// Normalize a loaded document into the in-memory snapshot form.
pub fn migrate_document(doc: LedgerDocument) -> LedgerSnapshot {
    LedgerSnapshot {
        people: migrate_people(doc.people),
        expenses: doc.expenses,
        last_updated: doc.last_updated,
    }
}
