use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, info};

use planner_db::Database;
use planner_types::Session;

use crate::auth::{self, Credentials};

/// The logged-in session, kept between invocations as a small JSON file.
///
/// Holds only the account id and username. Written by `login`, removed by
/// `logout`.
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Could not write session file {}", self.path.display()))?;
        debug!("Session saved to {}", self.path.display());
        Ok(())
    }

    pub fn load(&self) -> Result<Option<Session>> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Could not read session file {}", self.path.display())
                });
            }
        };
        let session = serde_json::from_str(&json)
            .with_context(|| format!("Corrupt session file {}", self.path.display()))?;
        Ok(Some(session))
    }

    /// Returns false if there was no session to clear.
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e)
                .with_context(|| format!("Could not remove session file {}", self.path.display())),
        }
    }
}

/// Rebuilds the saved session from the account it names.
///
/// A session whose account is gone, or now carries another username, is
/// rejected.
pub fn restore(db: &Database, file: &SessionFile) -> Result<Session> {
    let Some(saved) = file.load()? else {
        bail!("Not logged in: run `planner login` or pass --username and --password");
    };

    let account = db
        .get_account(saved.account_id)?
        .filter(|account| account.username == saved.username)
        .ok_or_else(|| {
            anyhow!(
                "Saved session for {} is no longer valid; log in again",
                saved.username
            )
        })?;

    info!("Restored session for {} ({})", account.username, account.id);
    Ok(Session::from(account))
}

/// Explicit credentials win over the saved session.
pub fn current(
    db: &Database,
    file: &SessionFile,
    username: Option<String>,
    password: Option<String>,
) -> Result<Session> {
    if username.is_some() || password.is_some() {
        let creds = Credentials::new(username, password)?;
        return auth::login(db, &creds);
    }
    restore(db, file)
}
