//! Lab portal client library
//!
//! The client side of the Bagree Diagnostic Centre website: test catalog and
//! search, appointment booking, passwordless sign-in, patient profiles and the
//! report upload/download flow. Auth, tables and file storage are provided by
//! a Supabase project; bookings go to the lab's own booking endpoint.
//!
//! ```no_run
//! use labdesk::LabDesk;
//!
//! # async fn run() -> Result<(), labdesk::error::Error> {
//! let desk = LabDesk::new("https://your-project.supabase.co", "your-anon-key")?;
//! let mut events = desk.auth().on_auth_state_change();
//! let mut portal = desk.portal();
//!
//! desk.auth().send_phone_otp("9876543210").await?;
//! desk.auth().verify_phone_otp("9876543210", "123456").await?;
//! portal.sync(&mut events).await?;
//! # Ok(())
//! # }
//! ```

pub mod admin;
pub mod auth;
pub mod booking;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;
pub mod policy;
pub mod portal;
pub mod postgrest;
pub mod profile;
pub mod reports;
pub mod storage;

use reqwest::Client;

use crate::auth::Auth;
use crate::booking::BookingClient;
use crate::catalog::Catalog;
use crate::config::{LabConfig, LabOptions};
use crate::error::Error;
use crate::portal::Portal;
use crate::postgrest::TableClient;
use crate::storage::StorageClient;

/// The main entry point for the lab portal client
pub struct LabDesk {
    /// The base URL for the Supabase project
    url: String,
    /// The anonymous API key for the Supabase project
    key: String,
    /// HTTP client used for requests
    http_client: Client,
    /// Auth client for sign-in and session events
    auth: Auth,
    /// The offered tests
    catalog: Catalog,
    /// Client options
    options: LabOptions,
}

impl LabDesk {
    /// Create a client with default options
    pub fn new(supabase_url: &str, supabase_key: &str) -> Result<Self, Error> {
        Self::new_with_options(supabase_url, supabase_key, LabOptions::default())
    }

    /// Create a client with custom options
    pub fn new_with_options(supabase_url: &str, supabase_key: &str, options: LabOptions) -> Result<Self, Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let url = supabase_url.trim_end_matches('/');
        let auth = Auth::new(url, supabase_key, http_client.clone(), options.clone());

        Ok(Self {
            url: url.to_string(),
            key: supabase_key.to_string(),
            http_client,
            auth,
            catalog: Catalog::sample(),
            options,
        })
    }

    /// Create a client from loaded configuration
    pub fn from_config(config: LabConfig) -> Result<Self, Error> {
        Self::new_with_options(&config.supabase_url, &config.supabase_key, config.options)
    }

    /// Get a reference to the auth client
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    pub fn options(&self) -> &LabOptions {
        &self.options
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Create a client for a table, acting as the anonymous role
    pub fn from(&self, table: &str) -> TableClient {
        TableClient::new(&self.url, &self.key, table, self.http_client.clone())
    }

    /// Create a storage client, acting as the anonymous role
    pub fn storage(&self) -> StorageClient {
        StorageClient::new(&self.url, &self.key, self.http_client.clone())
    }

    /// Create a client for the booking endpoint
    pub fn booking(&self) -> BookingClient {
        BookingClient::new(&self.options.booking_url(), self.http_client.clone())
    }

    /// Absolute URL of the downloadable rate list
    pub fn rate_list_url(&self) -> String {
        catalog::rate_list_url(&self.options.site_url)
    }

    /// Start a portal driven by this client's auth events
    pub fn portal(&self) -> Portal<'_> {
        Portal::new(self)
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::{AuthEvent, OAuthProvider, SignInMethod};
    pub use crate::booking::BookingForm;
    pub use crate::config::{LabConfig, LabOptions};
    pub use crate::error::Error;
    pub use crate::portal::{Portal, PortalState, PortalView};
    pub use crate::LabDesk;
}
