//! Passwordless authentication against the Supabase auth service
//!
//! Three sign-in strategies are supported side by side: SMS one-time codes,
//! email magic links and OAuth redirects. Whatever the strategy, a successful
//! sign-in stores the session and broadcasts [`AuthEvent::SignedIn`]; the
//! portal reacts to those events rather than to individual calls.

mod session;
mod types;

use reqwest::Client;
use serde_json::json;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

use crate::config::LabOptions;
use crate::error::Error;
use crate::fetch::Fetch;

pub use session::*;
pub use types::*;

/// Client for Supabase Authentication
pub struct Auth {
    /// The base URL for the Supabase project
    url: String,

    /// The anonymous API key for the Supabase project
    key: String,

    /// HTTP client used for requests
    client: Client,

    /// The current session
    session: Arc<RwLock<Option<Session>>>,

    /// Session change notifications
    events: broadcast::Sender<AuthEvent>,

    /// Client options
    options: LabOptions,
}

impl Auth {
    /// Create a new Auth client
    pub(crate) fn new(url: &str, key: &str, client: Client, options: LabOptions) -> Self {
        let (events, _) = broadcast::channel(16);

        Self {
            url: url.to_string(),
            key: key.to_string(),
            client,
            session: Arc::new(RwLock::new(None)),
            events,
            options,
        }
    }

    fn get_auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.url, path)
    }

    /// Subscribe to session changes
    pub fn on_auth_state_change(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Prefix the configured dial code unless the number already carries one
    pub fn international_phone(&self, phone: &str) -> String {
        let phone = phone.trim();
        if phone.starts_with('+') {
            phone.to_string()
        } else {
            format!("{}{}", self.options.phone_dial_code, phone)
        }
    }

    /// Send a one-time code by SMS
    pub async fn send_phone_otp(&self, phone: &str) -> Result<(), Error> {
        if phone.trim().is_empty() {
            return Err(Error::validation(NOTICE_ENTER_PHONE));
        }

        let url = self.get_auth_url("/otp");
        let body = json!({
            "phone": self.international_phone(phone),
            "create_user": true,
            "channel": "sms",
        });

        Fetch::post(&self.client, &url)
            .api_key(&self.key)
            .json(&body)?
            .execute_empty()
            .await?;

        log::info!("OTP sent to phone ending in {}", last_digits(phone));
        Ok(())
    }

    /// Verify an SMS code and sign in
    pub async fn verify_phone_otp(&self, phone: &str, token: &str) -> Result<Session, Error> {
        let body = json!({
            "phone": self.international_phone(phone),
            "token": token.trim(),
            "type": OtpType::Sms,
        });

        self.verify(body).await
    }

    /// Send a magic link (which also carries a one-time code) by email
    pub async fn send_magic_link(&self, email: &str, redirect_to: Option<&str>) -> Result<(), Error> {
        if email.trim().is_empty() {
            return Err(Error::validation(NOTICE_ENTER_EMAIL));
        }

        let url = self.get_auth_url("/otp");
        let body = json!({
            "email": email.trim(),
            "create_user": true,
        });

        let mut request = Fetch::post(&self.client, &url).api_key(&self.key);
        if let Some(redirect_to) = redirect_to {
            request = request.query([("redirect_to", redirect_to)]);
        }

        request.json(&body)?.execute_empty().await?;

        log::info!("Magic link sent");
        Ok(())
    }

    /// Verify the code from a magic-link email and sign in
    pub async fn verify_email_otp(&self, email: &str, token: &str) -> Result<Session, Error> {
        let body = json!({
            "email": email.trim(),
            "token": token.trim(),
            "type": OtpType::Email,
        });

        self.verify(body).await
    }

    async fn verify(&self, body: serde_json::Value) -> Result<Session, Error> {
        let url = self.get_auth_url("/verify");

        let result = Fetch::post(&self.client, &url)
            .api_key(&self.key)
            .json(&body)?
            .execute::<Session>()
            .await;

        self.complete_sign_in(result)
    }

    /// URL to send the browser to for an OAuth sign-in
    pub fn oauth_sign_in_url(&self, provider: OAuthProvider, options: Option<OAuthSignInOptions>) -> String {
        let options = options.unwrap_or_default();

        let mut url = format!("{}?provider={}", self.get_auth_url("/authorize"), provider.as_str());

        if let Some(redirect_to) = options.redirect_to {
            url.push_str(&format!("&redirect_to={}", urlencoding::encode(&redirect_to)));
        }

        if let Some(scopes) = options.scopes {
            url.push_str(&format!("&scopes={}", urlencoding::encode(&scopes)));
        }

        url
    }

    /// Exchange the code from an OAuth callback for a session
    pub async fn exchange_code_for_session(&self, code: &str) -> Result<Session, Error> {
        let url = self.get_auth_url("/token");

        let request = Fetch::post(&self.client, &url)
            .api_key(&self.key)
            .query([("grant_type", "authorization_code")])
            .json(&json!({ "code": code }))?;

        let result = request.execute::<Session>().await;
        self.complete_sign_in(result)
    }

    /// Take the session from a magic-link or OAuth redirect URL
    pub fn session_from_redirect(&self, redirect: &str) -> Result<Session, Error> {
        self.complete_sign_in(Session::from_redirect_url(redirect))
    }

    fn complete_sign_in(&self, result: Result<Session, Error>) -> Result<Session, Error> {
        match result {
            Ok(session) => {
                log::info!("User {} signed in", session.user.id);
                self.store(Some(session.clone()));
                self.events.send(AuthEvent::SignedIn(session.clone())).ok();
                Ok(session)
            }
            Err(err) => {
                log::warn!("Sign-in failed: {}", err);
                self.events.send(AuthEvent::SignInFailed(err.user_message())).ok();
                Err(err)
            }
        }
    }

    /// Sign out the current user
    pub async fn sign_out(&self) -> Result<(), Error> {
        let token = self.access_token().ok_or(Error::NotAuthenticated)?;
        self.sign_out_token(&token).await
    }

    /// Revoke the session owning `access_token` and forget the stored one
    pub async fn sign_out_token(&self, access_token: &str) -> Result<(), Error> {
        let url = self.get_auth_url("/logout");
        Fetch::post(&self.client, &url)
            .api_key(&self.key)
            .bearer_auth(access_token)
            .execute_empty()
            .await?;

        self.store(None);
        self.events.send(AuthEvent::SignedOut).ok();
        log::info!("Signed out");

        Ok(())
    }

    /// Get the current session
    pub fn get_session(&self) -> Option<Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Set the session, e.g. one restored by the embedding application
    pub fn set_session(&self, session: Session) {
        self.store(Some(session.clone()));
        self.events.send(AuthEvent::SignedIn(session)).ok();
    }

    /// Access token of the current session, if any
    pub fn access_token(&self) -> Option<String> {
        self.get_session().map(|s| s.access_token)
    }

    fn store(&self, session: Option<Session>) {
        if session.is_some() && !self.options.persist_session {
            return;
        }
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session;
    }
}

fn last_digits(phone: &str) -> &str {
    let phone = phone.trim();
    let start = phone.char_indices().rev().nth(3).map(|(i, _)| i).unwrap_or(0);
    &phone[start..]
}
