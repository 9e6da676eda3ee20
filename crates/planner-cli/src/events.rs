use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use tracing::info;

use planner_db::Database;
use planner_query::EventQuery;
use planner_types::{Event, EventFields, EventId, Session};

/// Trims and checks user input before it reaches the store.
pub fn validate_fields(name: &str, date: &str, time: Option<String>) -> Result<EventFields> {
    let name = name.trim();
    let date = date.trim();
    if name.is_empty() {
        bail!("Event name is required");
    }
    if date.is_empty() {
        bail!("Event date is required");
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("Event date must be YYYY-MM-DD, got {:?}", date))?;

    let time = time.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    Ok(EventFields::with_default_time(name, date, time))
}

pub fn add(db: &Database, session: &Session, fields: &EventFields) -> Result<EventId> {
    let id = db
        .create_event(session.account_id, fields)
        .context("Could not add event")?;
    info!("{} added event {} ({})", session.username, id, fields.name);
    Ok(id)
}

/// The session's events, filtered by `query` and sorted by date and time.
pub fn list(db: &Database, session: &Session, query: Option<&str>) -> Result<Vec<Event>> {
    let events = db.list_events_for_owner(session.account_id)?;
    Ok(EventQuery::new(events)
        .filter(query.unwrap_or_default())
        .sorted()
        .into_vec())
}

pub fn update(db: &Database, session: &Session, id: EventId, fields: &EventFields) -> Result<()> {
    owned_event(db, session, id)?;
    if !db.update_event(id, fields)? {
        bail!("Event not found: {}", id);
    }
    info!("{} updated event {}", session.username, id);
    Ok(())
}

pub fn delete(db: &Database, session: &Session, id: EventId) -> Result<()> {
    owned_event(db, session, id)?;
    if !db.delete_event(id)? {
        bail!("Event not found: {}", id);
    }
    info!("{} deleted event {}", session.username, id);
    Ok(())
}

/// Other accounts' events are reported as missing.
fn owned_event(db: &Database, session: &Session, id: EventId) -> Result<Event> {
    db.get_event(id)?
        .filter(|event| session.owns(event.owner_id))
        .ok_or_else(|| anyhow!("Event not found: {}", id))
}

pub fn render_table(events: &[Event]) -> String {
    if events.is_empty() {
        return "No events.\n".to_string();
    }

    let mut out = format!("{:>5}  {:<10}  {:<8}  {}\n", "ID", "DATE", "TIME", "NAME");
    for event in events {
        out.push_str(&format!(
            "{:>5}  {:<10}  {:<8}  {}\n",
            event.id, event.date, event.time, event.name
        ));
    }
    out
}
