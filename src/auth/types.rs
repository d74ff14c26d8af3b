//! Types for authentication and session events

use serde::{Deserialize, Serialize};

use super::Session;

/// Shown when phone sign-in is attempted without a number
pub const NOTICE_ENTER_PHONE: &str = "Enter phone number";

/// Shown when email sign-in is attempted without an address
pub const NOTICE_ENTER_EMAIL: &str = "Enter email address";

/// Shown after an OTP was dispatched
pub const NOTICE_OTP_SENT: &str = "OTP sent! Check your phone.";

/// Shown after a magic link was dispatched
pub const NOTICE_MAGIC_LINK_SENT: &str = "Check your email for the login link.";

/// Shown after a successful sign-in
pub const NOTICE_SIGNED_IN: &str = "Logged in successfully!";

/// The auth identity as returned by the auth service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user ID
    pub id: String,

    /// The user's email address
    #[serde(default)]
    pub email: Option<String>,

    /// The user's phone number, in international format
    #[serde(default)]
    pub phone: Option<String>,
}

/// Session change notifications, in the order they happen
#[derive(Debug, Clone)]
pub enum AuthEvent {
    /// A session was established
    SignedIn(Session),

    /// A sign-in attempt was rejected; the previous state stands
    SignInFailed(String),

    /// The session was cleared
    SignedOut,
}

/// The sign-in strategy a deployment uses.
///
/// The strategies are alternatives, not steps of one flow; a portal is
/// configured with exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInMethod {
    /// One-time code sent by SMS
    PhoneOtp,

    /// Passwordless link (or code) sent by email
    EmailMagicLink,

    /// Redirect through a third-party identity provider
    OAuth(OAuthProvider),
}

/// OAuth providers the portal can redirect to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Google,
    Github,
    Apple,
    Facebook,
}

impl OAuthProvider {
    /// Provider identifier used by the authorize endpoint
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Github => "github",
            OAuthProvider::Apple => "apple",
            OAuthProvider::Facebook => "facebook",
        }
    }
}

/// Options for building an OAuth authorize URL
#[derive(Debug, Clone, Default)]
pub struct OAuthSignInOptions {
    /// Where the provider sends the browser back to
    pub redirect_to: Option<String>,

    /// Space-separated scopes to request
    pub scopes: Option<String>,
}

/// Kinds of one-time token accepted by the verify endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpType {
    Sms,
    Email,
    Magiclink,
}
