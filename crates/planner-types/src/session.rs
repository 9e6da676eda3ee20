use serde::{Deserialize, Serialize};

use crate::models::{Account, AccountId};

/// An authenticated caller.
///
/// Handed out by the front end after a successful credential check and passed
/// explicitly into every event operation. There is no process-wide login flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub account_id: AccountId,
    pub username: String,
}

impl Session {
    pub fn owns(&self, owner_id: AccountId) -> bool {
        self.account_id == owner_id
    }
}

impl From<Account> for Session {
    fn from(account: Account) -> Self {
        Self {
            account_id: account.id,
            username: account.username,
        }
    }
}
