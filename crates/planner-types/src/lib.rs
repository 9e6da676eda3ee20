pub mod models;
pub mod session;

pub use models::{Account, AccountId, DEFAULT_EVENT_TIME, Event, EventFields, EventId};
pub use session::Session;
