//! Application-level user profiles

use serde::{Deserialize, Serialize};

use crate::auth::Session;
use crate::error::Error;
use crate::postgrest::TableClient;

/// Shown when the profile form is submitted incomplete
pub const MSG_PROFILE_FIELDS: &str = "Please enter your name and phone.";

/// One row of the users table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Auth user ID; the conflict key of the table
    pub uid: String,
    pub name: String,
    /// Phone as typed; reports are matched against it verbatim
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Granted out of band, directly in the data store
    #[serde(default)]
    pub is_admin: bool,
}

/// What the portal writes; `is_admin` is always false
#[derive(Debug, Serialize)]
struct ProfileUpsert<'a> {
    uid: &'a str,
    name: &'a str,
    phone: &'a str,
    email: Option<&'a str>,
    is_admin: bool,
}

/// Reads and writes profile rows
pub struct ProfileStore {
    table: TableClient,
}

impl ProfileStore {
    pub fn new(table: TableClient) -> Self {
        Self { table }
    }

    /// Profile of the signed-in user, if they completed setup
    pub async fn load(&self, session: &Session) -> Result<Option<Profile>, Error> {
        self.table
            .select("*")
            .eq("uid", &session.user.id)
            .execute_one::<Profile>()
            .await
    }

    /// Create or replace the signed-in user's profile.
    ///
    /// The admin flag is never raised from here; the row comes back with
    /// whatever the store holds after the write.
    pub async fn save(&self, session: Option<&Session>, name: &str, phone: &str) -> Result<Profile, Error> {
        let session = session.ok_or(Error::NotAuthenticated)?;

        let name = name.trim();
        if name.is_empty() || phone.trim().is_empty() {
            return Err(Error::validation(MSG_PROFILE_FIELDS));
        }

        let row = ProfileUpsert {
            uid: &session.user.id,
            name,
            phone,
            email: session.user.email.as_deref(),
            is_admin: false,
        };

        let stored = self
            .table
            .upsert(&row, "uid")
            .execute::<Profile>()
            .await?;

        log::info!("Saved profile for user {}", session.user.id);

        stored
            .into_iter()
            .next()
            .ok_or_else(|| Error::database("upsert returned no profile row"))
    }
}
