// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use core::cmp::Ordering;
use std::fmt::{self, Display};

/// A keyed row, ordered by `id` first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Record {
    pub id: u32,
    pub name: String,
}

impl Record {
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Compares two records by `id` only.
    #[must_use]
    pub fn by_id(left: &Self, right: &Self) -> Ordering {
        left.id.cmp(&right.id)
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record[id={}, name={}]", self.id, self.name)
    }
}

/// `[(id, name)]` as records, in the given order.
#[must_use]
pub fn records(rows: &[(u32, &str)]) -> Vec<Record> {
    rows.iter().map(|(id, name)| Record::new(*id, *name)).collect()
}

pub fn record_alice() -> Record {
    Record::new(1, "Alice")
}

pub fn record_bob() -> Record {
    Record::new(2, "Bob")
}

pub fn record_charlie() -> Record {
    Record::new(3, "Charlie")
}

pub fn record_diane() -> Record {
    Record::new(4, "Diane")
}
