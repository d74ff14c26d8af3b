//! Configuration options for the lab portal client

use std::env;
use std::time::Duration;

use crate::auth::{OAuthProvider, SignInMethod};
use crate::error::Error;

/// Default path of the booking backend, relative to the site URL
pub const DEFAULT_BOOKING_PATH: &str = "/api/book-appointment";

/// Configuration options for the lab portal client
#[derive(Debug, Clone)]
pub struct LabOptions {
    /// Public site the portal is served from; relative paths resolve against it
    pub site_url: String,

    /// Booking endpoint, absolute or relative to `site_url`
    pub booking_endpoint: String,

    /// Table holding one profile row per user
    pub users_table: String,

    /// Table holding report metadata
    pub reports_table: String,

    /// Storage bucket receiving uploaded reports
    pub reports_bucket: String,

    /// Country dial code prefixed to phone numbers for OTP sign-in
    pub phone_dial_code: String,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Whether to keep the session returned by sign-in calls
    pub persist_session: bool,

    /// How users sign in
    pub sign_in_method: SignInMethod,
}

impl Default for LabOptions {
    fn default() -> Self {
        Self {
            site_url: "http://localhost:5173".to_string(),
            booking_endpoint: DEFAULT_BOOKING_PATH.to_string(),
            users_table: "users".to_string(),
            reports_table: "reports".to_string(),
            reports_bucket: "reports".to_string(),
            phone_dial_code: "+91".to_string(),
            request_timeout: Some(Duration::from_secs(30)),
            persist_session: true,
            sign_in_method: SignInMethod::PhoneOtp,
        }
    }
}

impl LabOptions {
    /// Set the public site URL
    pub fn with_site_url(mut self, value: &str) -> Self {
        self.site_url = value.trim_end_matches('/').to_string();
        self
    }

    /// Set the booking endpoint
    pub fn with_booking_endpoint(mut self, value: &str) -> Self {
        self.booking_endpoint = value.to_string();
        self
    }

    /// Set the users table name
    pub fn with_users_table(mut self, value: &str) -> Self {
        self.users_table = value.to_string();
        self
    }

    /// Set the reports table name
    pub fn with_reports_table(mut self, value: &str) -> Self {
        self.reports_table = value.to_string();
        self
    }

    /// Set the reports bucket
    pub fn with_reports_bucket(mut self, value: &str) -> Self {
        self.reports_bucket = value.to_string();
        self
    }

    /// Set the phone dial code
    pub fn with_phone_dial_code(mut self, value: &str) -> Self {
        self.phone_dial_code = value.to_string();
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set whether to persist the session
    pub fn with_persist_session(mut self, value: bool) -> Self {
        self.persist_session = value;
        self
    }

    /// Set the sign-in method
    pub fn with_sign_in_method(mut self, value: SignInMethod) -> Self {
        self.sign_in_method = value;
        self
    }

    /// Absolute URL of the booking endpoint
    pub fn booking_url(&self) -> String {
        if self.booking_endpoint.starts_with("http://") || self.booking_endpoint.starts_with("https://") {
            self.booking_endpoint.clone()
        } else {
            format!("{}/{}", self.site_url.trim_end_matches('/'), self.booking_endpoint.trim_start_matches('/'))
        }
    }
}

/// Everything needed to build a [`crate::LabDesk`]
#[derive(Debug, Clone)]
pub struct LabConfig {
    /// The base URL for the Supabase project
    pub supabase_url: String,

    /// The anonymous API key for the Supabase project
    pub supabase_key: String,

    /// Client options
    pub options: LabOptions,
}

impl LabConfig {
    /// Load configuration from the environment, reading `.env` first if present.
    ///
    /// `SUPABASE_URL` and `SUPABASE_KEY` are required; the `LAB_*` variables
    /// override the matching [`LabOptions`] defaults.
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();

        let supabase_url = required("SUPABASE_URL")?;
        let supabase_key = required("SUPABASE_KEY")?;

        let mut options = LabOptions::default();
        if let Some(site) = optional("LAB_SITE_URL") {
            options = options.with_site_url(&site);
        }
        if let Some(endpoint) = optional("LAB_BOOKING_ENDPOINT") {
            options = options.with_booking_endpoint(&endpoint);
        }
        if let Some(bucket) = optional("LAB_REPORTS_BUCKET") {
            options = options.with_reports_bucket(&bucket);
        }
        if let Some(code) = optional("LAB_DIAL_CODE") {
            options = options.with_phone_dial_code(&code);
        }
        if let Some(secs) = optional("LAB_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|e| Error::config(format!("LAB_REQUEST_TIMEOUT_SECS: {}", e)))?;
            options = options.with_request_timeout(Some(Duration::from_secs(secs)));
        }
        if let Some(method) = optional("LAB_SIGN_IN_METHOD") {
            options = options.with_sign_in_method(parse_sign_in_method(&method)?);
        }

        log::debug!("Loaded configuration for {}", supabase_url);

        Ok(Self {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            supabase_key,
            options,
        })
    }
}

fn required(key: &str) -> Result<String, Error> {
    env::var(key).map_err(|_| Error::config(format!("{} must be set", key)))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse `phone`, `magic-link` or `oauth[:provider]`
pub fn parse_sign_in_method(value: &str) -> Result<SignInMethod, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "phone" | "phone-otp" | "otp" => Ok(SignInMethod::PhoneOtp),
        "email" | "magic-link" | "magiclink" => Ok(SignInMethod::EmailMagicLink),
        "oauth" | "oauth:google" | "google" => Ok(SignInMethod::OAuth(OAuthProvider::Google)),
        "oauth:github" | "github" => Ok(SignInMethod::OAuth(OAuthProvider::Github)),
        other => Err(Error::config(format!("unknown sign-in method: {}", other))),
    }
}
