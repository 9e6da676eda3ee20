use anyhow::{Context, Result, anyhow, bail};
use tracing::info;

use planner_db::{Database, StoreError};
use planner_types::Session;

pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Both fields are required and must not be blank. Surrounding whitespace
    /// is dropped from both.
    pub fn new(username: Option<String>, password: Option<String>) -> Result<Self> {
        let username = username
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| anyhow!("Username is required (--username or PLANNER_USERNAME)"))?;
        let password = password
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| anyhow!("Password is required (--password or PLANNER_PASSWORD)"))?;

        Ok(Self { username, password })
    }
}

pub fn register(db: &Database, creds: &Credentials) -> Result<Session> {
    match db.create_account(&creds.username, &creds.password) {
        Ok(account_id) => Ok(Session {
            account_id,
            username: creds.username.clone(),
        }),
        Err(StoreError::UsernameTaken(name)) => bail!("Username already exists: {}", name),
        Err(e) => Err(e).context("Account creation failed"),
    }
}

/// Checks credentials and returns the session every event command runs under.
pub fn login(db: &Database, creds: &Credentials) -> Result<Session> {
    if !db
        .verify_credentials(&creds.username, &creds.password)
        .context("Credential check failed")?
    {
        bail!("Invalid username or password");
    }

    let account_id = db
        .lookup_account_id(&creds.username)?
        .ok_or_else(|| anyhow!("Account disappeared: {}", creds.username))?;

    info!("Logged in as {} ({})", creds.username, account_id);
    Ok(Session {
        account_id,
        username: creds.username.clone(),
    })
}
