use planner_types::{Account, AccountId, Event, EventFields, EventId};
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::Database;
use crate::error::{Result, StoreError, is_foreign_key_violation, is_unique_violation};
use crate::models::{EventRow, UserRow};
use crate::password;

impl Database {
    // -- Accounts --

    /// Registers a new account. The password is stored as a salted Argon2id hash.
    pub fn create_account(&self, username: &str, password: &str) -> Result<AccountId> {
        let password_hash = password::hash_password(password)?;

        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (username, password) VALUES (?1, ?2)",
                (username, &password_hash),
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::UsernameTaken(username.to_string())
                } else {
                    e.into()
                }
            })?;

            let id = AccountId(conn.last_insert_rowid());
            info!("Created account {} ({})", username, id);
            Ok(id)
        })
    }

    /// True iff `username` exists and `password` matches its stored hash.
    ///
    /// A stored value that is not a password hash (e.g. plaintext left by an
    /// older file) never matches.
    pub fn verify_credentials(&self, username: &str, password: &str) -> Result<bool> {
        let Some(user) = self.with_conn(|conn| query_user_by_username(conn, username))? else {
            debug!("Credential check for unknown user {}", username);
            return Ok(false);
        };

        match password::verify_password(password, &user.password) {
            Err(StoreError::PasswordHash(e)) => {
                warn!("Stored password for {} is not a valid hash ({}); refusing login", username, e);
                Ok(false)
            }
            result => result,
        }
    }

    pub fn lookup_account_id(&self, username: &str) -> Result<Option<AccountId>> {
        self.with_conn(|conn| {
            let id = conn
                .query_row("SELECT id FROM users WHERE username = ?1", [username], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(id.map(AccountId))
        })
    }

    pub fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, username, password FROM users WHERE id = ?1",
                    [id.0],
                    user_from_row,
                )
                .optional()?;
            Ok(row.map(Account::from))
        })
    }

    // -- Events --

    /// Inserts an event owned by `owner_id` and returns its id.
    pub fn create_event(&self, owner_id: AccountId, fields: &EventFields) -> Result<EventId> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO events (event_name, event_date, event_time, user_id) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![fields.name, fields.date, fields.time, owner_id.0],
            )
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    StoreError::UnknownOwner(owner_id)
                } else {
                    e.into()
                }
            })?;

            let id = EventId(conn.last_insert_rowid());
            debug!("Created event {} for account {}", id, owner_id);
            Ok(id)
        })
    }

    /// Every event owned by `owner_id`, in storage order.
    pub fn list_events_for_owner(&self, owner_id: AccountId) -> Result<Vec<Event>> {
        self.with_conn(|conn| query_events_for_owner(conn, owner_id))
    }

    pub fn get_event(&self, id: EventId) -> Result<Option<Event>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT event_id, event_name, event_date, event_time, user_id
                     FROM events WHERE event_id = ?1",
                    [id.0],
                    event_from_row,
                )
                .optional()?;
            Ok(row.map(Event::from))
        })
    }

    /// Overwrites name, date and time. Returns false if no event has `id`.
    pub fn update_event(&self, id: EventId, fields: &EventFields) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE events SET event_name = ?1, event_date = ?2, event_time = ?3 WHERE event_id = ?4",
                rusqlite::params![fields.name, fields.date, fields.time, id.0],
            )?;
            debug!("Update event {}: {} row(s)", id, changed);
            Ok(changed > 0)
        })
    }

    /// Returns false if no event has `id`.
    pub fn delete_event(&self, id: EventId) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM events WHERE event_id = ?1", [id.0])?;
            debug!("Delete event {}: {} row(s)", id, changed);
            Ok(changed > 0)
        })
    }
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
    })
}

fn event_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        event_id: row.get(0)?,
        event_name: row.get(1)?,
        event_date: row.get(2)?,
        event_time: row.get(3)?,
        user_id: row.get(4)?,
    })
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare("SELECT id, username, password FROM users WHERE username = ?1")?;
    let row = stmt.query_row([username], user_from_row).optional()?;
    Ok(row)
}

fn query_events_for_owner(conn: &Connection, owner_id: AccountId) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, event_name, event_date, event_time, user_id
         FROM events
         WHERE user_id = ?1",
    )?;

    let rows = stmt
        .query_map([owner_id.0], event_from_row)?
        .map(|row| row.map(Event::from))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn fields(name: &str, date: &str, time: &str) -> EventFields {
        EventFields::new(name, date, time)
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let db = db();
        db.create_account("a", "p1").unwrap();

        let err = db.create_account("a", "p2").unwrap_err();
        assert!(matches!(err, StoreError::UsernameTaken(ref name) if name == "a"));

        // first password still wins
        assert!(db.verify_credentials("a", "p1").unwrap());
        assert!(!db.verify_credentials("a", "p2").unwrap());
    }

    #[test]
    fn usernames_are_case_sensitive() {
        let db = db();
        db.create_account("alice", "pw").unwrap();
        db.create_account("Alice", "pw").unwrap();

        assert!(!db.verify_credentials("ALICE", "pw").unwrap());
        assert_ne!(
            db.lookup_account_id("alice").unwrap(),
            db.lookup_account_id("Alice").unwrap()
        );
    }

    #[test]
    fn credential_check() {
        let db = db();
        db.create_account("u", "p").unwrap();

        assert!(db.verify_credentials("u", "p").unwrap());
        assert!(!db.verify_credentials("u", "px").unwrap());
        assert!(!db.verify_credentials("nouser", "p").unwrap());
    }

    #[test]
    fn password_is_not_stored_verbatim() {
        let db = db();
        db.create_account("u", "plaintext").unwrap();

        let stored: String = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT password FROM users WHERE username = 'u'", [], |r| {
                    r.get(0)
                })?)
            })
            .unwrap();
        assert_ne!(stored, "plaintext");
        assert!(!stored.contains("plaintext"));
    }

    #[test]
    fn unhashed_stored_password_never_verifies() {
        let db = db();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, password) VALUES ('legacy', 'pw')",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        assert!(!db.verify_credentials("legacy", "pw").unwrap());
        assert!(!db.verify_credentials("legacy", "other").unwrap());
    }

    #[test]
    fn lookup_account_id_and_not_found() {
        let db = db();
        let id = db.create_account("u", "p").unwrap();

        assert_eq!(db.lookup_account_id("u").unwrap(), Some(id));
        assert_eq!(db.lookup_account_id("nouser").unwrap(), None);

        let account = db.get_account(id).unwrap().unwrap();
        assert_eq!(account.username, "u");
        assert!(db.get_account(AccountId(id.0 + 100)).unwrap().is_none());
    }

    #[test]
    fn event_ids_increase() {
        let db = db();
        let owner = db.create_account("u", "p").unwrap();

        let first = db.create_event(owner, &fields("A", "2025-01-01", "09:00")).unwrap();
        let second = db.create_event(owner, &fields("B", "2025-01-02", "09:00")).unwrap();
        assert!(second > first);
    }

    #[test]
    fn event_ids_are_not_reused_after_delete() {
        let db = db();
        let owner = db.create_account("u", "p").unwrap();

        let first = db.create_event(owner, &fields("A", "2025-01-01", "09:00")).unwrap();
        assert!(db.delete_event(first).unwrap());
        let second = db.create_event(owner, &fields("B", "2025-01-02", "09:00")).unwrap();
        assert!(second > first);
    }

    #[test]
    fn create_list_update_round_trip() {
        let db = db();
        let owner = db.create_account("u", "p").unwrap();
        let id = db
            .create_event(owner, &fields("Dentist", "2025-01-05", "09:00"))
            .unwrap();

        let events = db.list_events_for_owner(owner).unwrap();
        assert_eq!(
            events,
            vec![Event {
                id,
                name: "Dentist".into(),
                date: "2025-01-05".into(),
                time: "09:00".into(),
                owner_id: owner,
            }]
        );

        let updated = fields("Dentist (moved)", "2025-01-06", "10:30");
        assert!(db.update_event(id, &updated).unwrap());

        let event = db.get_event(id).unwrap().unwrap();
        assert_eq!(event.id, id);
        assert_eq!(event.owner_id, owner);
        assert_eq!(event.fields(), updated);
    }

    #[test]
    fn update_missing_event_returns_false() {
        let db = db();
        assert!(!db.update_event(EventId(42), &fields("x", "2025-01-01", "09:00")).unwrap());
    }

    #[test]
    fn delete_is_not_repeatable() {
        let db = db();
        let owner = db.create_account("u", "p").unwrap();
        let id = db.create_event(owner, &fields("A", "2025-01-01", "09:00")).unwrap();

        assert!(db.delete_event(id).unwrap());
        assert!(!db.delete_event(id).unwrap());
        assert!(db.list_events_for_owner(owner).unwrap().is_empty());
        assert!(db.get_event(id).unwrap().is_none());
    }

    #[test]
    fn owners_see_only_their_events() {
        let db = db();
        let a = db.create_account("a", "p").unwrap();
        let b = db.create_account("b", "p").unwrap();

        db.create_event(a, &fields("A1", "2025-01-01", "09:00")).unwrap();
        db.create_event(a, &fields("A2", "2025-01-02", "09:00")).unwrap();
        db.create_event(b, &fields("B1", "2025-01-03", "09:00")).unwrap();

        let for_b = db.list_events_for_owner(b).unwrap();
        assert_eq!(for_b.len(), 1);
        assert!(for_b.iter().all(|e| e.owner_id == b));

        let for_a = db.list_events_for_owner(a).unwrap();
        assert_eq!(for_a.len(), 2);
        assert!(for_a.iter().all(|e| e.owner_id == a));
    }

    #[test]
    fn event_for_unknown_owner_is_rejected() {
        let db = db();
        let err = db
            .create_event(AccountId(999), &fields("A", "2025-01-01", "09:00"))
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownOwner(AccountId(999))));
    }

    #[test]
    fn store_does_not_validate_event_fields() {
        let db = db();
        let owner = db.create_account("u", "p").unwrap();
        let id = db.create_event(owner, &fields("", "not a date", "")).unwrap();

        let event = db.get_event(id).unwrap().unwrap();
        assert_eq!(event.name, "");
        assert_eq!(event.date, "not a date");
    }
}
