//! Metastore notification events and their change records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a metastore notification event.
///
/// Ids are assigned by the upstream metastore and are intended to advance
/// by one per event, but gaps, duplicates, and backward jumps do occur and
/// callers must tolerate them. `EventId::ZERO` means "nothing persisted".
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(u64);

impl EventId {
    pub const ZERO: EventId = EventId(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn next(self) -> EventId {
        let next = self
            .0
            .checked_add(1)
            .expect("event id overflow computing next");
        EventId(next)
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({})", self.0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<EventId> for u64 {
    fn from(value: EventId) -> u64 {
        value.0
    }
}

/// One notification event as delivered by the metastore.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HmsEvent {
    pub id: EventId,
    pub record: ChangeRecord,
    pub timestamp_ms: u64,
}

impl HmsEvent {
    pub fn new(id: EventId, record: ChangeRecord, timestamp_ms: u64) -> Self {
        Self {
            id,
            record,
            timestamp_ms,
        }
    }
}

/// The parsed change carried by a notification event.
///
/// Locations are HDFS-style paths. Events the metastore emits for object
/// kinds we do not track arrive as `Unrecognized` and are semantically
/// no-ops; their ids must still advance the persisted stream head.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeRecord {
    CreateDatabase {
        database: String,
        location: Option<String>,
    },
    DropDatabase {
        database: String,
        location: Option<String>,
    },
    CreateTable {
        database: String,
        table: String,
        location: Option<String>,
    },
    DropTable {
        database: String,
        table: String,
        location: Option<String>,
    },
    AlterTable {
        database: String,
        table: String,
        old_location: Option<String>,
        new_location: Option<String>,
    },
    AddPartition {
        database: String,
        table: String,
        location: Option<String>,
    },
    DropPartition {
        database: String,
        table: String,
        location: Option<String>,
    },
    AlterPartition {
        database: String,
        table: String,
        old_location: Option<String>,
        new_location: Option<String>,
    },
    Unrecognized {
        #[serde(rename = "event_kind")]
        kind: String,
    },
}

impl ChangeRecord {
    /// The authorizable object this record is about, in `db` or `db.table`
    /// form. `None` for unrecognized records.
    pub fn authorizable(&self) -> Option<String> {
        match self {
            ChangeRecord::CreateDatabase { database, .. }
            | ChangeRecord::DropDatabase { database, .. } => Some(database.clone()),
            ChangeRecord::CreateTable {
                database, table, ..
            }
            | ChangeRecord::DropTable {
                database, table, ..
            }
            | ChangeRecord::AlterTable {
                database, table, ..
            }
            | ChangeRecord::AddPartition {
                database, table, ..
            }
            | ChangeRecord::DropPartition {
                database, table, ..
            }
            | ChangeRecord::AlterPartition {
                database, table, ..
            } => Some(format!("{database}.{table}")),
            ChangeRecord::Unrecognized { .. } => None,
        }
    }

    /// True when the record names at least one location the path image can
    /// be updated from.
    pub fn has_location(&self) -> bool {
        match self {
            ChangeRecord::CreateDatabase { location, .. }
            | ChangeRecord::DropDatabase { location, .. }
            | ChangeRecord::CreateTable { location, .. }
            | ChangeRecord::DropTable { location, .. }
            | ChangeRecord::AddPartition { location, .. }
            | ChangeRecord::DropPartition { location, .. } => location.is_some(),
            ChangeRecord::AlterTable {
                old_location,
                new_location,
                ..
            }
            | ChangeRecord::AlterPartition {
                old_location,
                new_location,
                ..
            } => old_location.is_some() || new_location.is_some(),
            ChangeRecord::Unrecognized { .. } => false,
        }
    }
}
