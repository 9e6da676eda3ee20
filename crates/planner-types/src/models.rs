use std::fmt;

use serde::{Deserialize, Serialize};

/// Time used for events created without one.
pub const DEFAULT_EVENT_TIME: &str = "10:00 AM";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub i64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A registered user. The password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    /// `YYYY-MM-DD` by convention. Not validated here.
    pub date: String,
    /// Free-form, e.g. `"10:00 AM"` or `"14:30"`.
    pub time: String,
    pub owner_id: AccountId,
}

/// The user-editable part of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFields {
    pub name: String,
    pub date: String,
    pub time: String,
}

impl EventFields {
    pub fn new(name: impl Into<String>, date: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            date: date.into(),
            time: time.into(),
        }
    }

    /// Fields with [`DEFAULT_EVENT_TIME`] filled in when `time` is absent.
    pub fn with_default_time(
        name: impl Into<String>,
        date: impl Into<String>,
        time: Option<String>,
    ) -> Self {
        Self::new(name, date, time.unwrap_or_else(|| DEFAULT_EVENT_TIME.to_string()))
    }
}

impl Event {
    pub fn fields(&self) -> EventFields {
        EventFields::new(self.name.clone(), self.date.clone(), self.time.clone())
    }
}
