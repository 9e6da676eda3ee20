//! Database row types. These map directly to SQLite rows and are kept apart
//! from the `planner-types` models so the password hash never leaks out.

use planner_types::{Account, AccountId, Event, EventId};

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
}

pub struct EventRow {
    pub event_id: i64,
    pub event_name: String,
    pub event_date: String,
    pub event_time: String,
    pub user_id: i64,
}

impl From<UserRow> for Account {
    fn from(row: UserRow) -> Self {
        Account {
            id: AccountId(row.id),
            username: row.username,
        }
    }
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: EventId(row.event_id),
            name: row.event_name,
            date: row.event_date,
            time: row.event_time,
            owner_id: AccountId(row.user_id),
        }
    }
}
