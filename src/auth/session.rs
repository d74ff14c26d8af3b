//! Session management for authentication

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

use super::User;
use crate::error::Error;

/// Session data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// The access token
    pub access_token: String,

    /// The refresh token
    pub refresh_token: String,

    /// The token type
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// The expiry time in seconds
    pub expires_in: i64,

    /// The expiry timestamp
    #[serde(default)]
    pub expires_at: Option<i64>,

    /// The signed-in user
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Claims read from a Supabase access token
#[derive(Debug, Deserialize)]
struct AccessTokenClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    exp: Option<i64>,
}

impl Session {
    /// Create a new session
    pub fn new(access_token: String, refresh_token: String, user: User, expires_in: i64) -> Self {
        let now = chrono::Utc::now().timestamp();

        Self {
            access_token,
            refresh_token,
            token_type: default_token_type(),
            expires_in,
            expires_at: Some(now + expires_in),
            user,
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => chrono::Utc::now().timestamp() >= expires_at,
            None => false,
        }
    }

    /// Rebuild a session from the URL the auth service redirected back to.
    ///
    /// Magic links and implicit OAuth put the tokens in the fragment; some
    /// proxies move them to the query string, so both are read. The user is
    /// taken from the access token claims. The signature is not checked here;
    /// every later request is verified by the service itself.
    pub fn from_redirect_url(redirect: &str) -> Result<Self, Error> {
        let url = Url::parse(redirect)?;

        let mut params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        if let Some(fragment) = url.fragment() {
            params.extend(url::form_urlencoded::parse(fragment.as_bytes()).into_owned());
        }

        if let Some(description) = params.get("error_description").or_else(|| params.get("error")) {
            return Err(Error::auth(description));
        }

        let access_token = params
            .get("access_token")
            .cloned()
            .ok_or_else(|| Error::auth("redirect URL carries no access_token"))?;
        let refresh_token = params.get("refresh_token").cloned().unwrap_or_default();
        let expires_in = params
            .get("expires_in")
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(3600);

        let claims = read_claims(&access_token)?;
        let user = User {
            id: claims.sub,
            email: claims.email.filter(|e| !e.is_empty()),
            phone: claims.phone.filter(|p| !p.is_empty()),
        };

        let mut session = Session::new(access_token, refresh_token, user, expires_in);
        if let Some(token_type) = params.get("token_type") {
            session.token_type = token_type.clone();
        }
        if let Some(expires_at) = params.get("expires_at").and_then(|v| v.parse().ok()).or(claims.exp) {
            session.expires_at = Some(expires_at);
        }

        Ok(session)
    }
}

fn read_claims(token: &str) -> Result<AccessTokenClaims, Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<AccessTokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn token(claims: serde_json::Value) -> String {
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"project-jwt-secret")).unwrap()
    }

    #[test]
    fn session_from_magic_link_fragment() {
        let access = token(json!({
            "sub": "8d0f3c1e-user",
            "email": "patient@example.com",
            "phone": "",
            "aud": "authenticated",
            "exp": 4102444800i64
        }));
        let redirect = format!(
            "https://bagreedx.com/#access_token={}&expires_in=3600&refresh_token=r-123&token_type=bearer&type=magiclink",
            access
        );

        let session = Session::from_redirect_url(&redirect).unwrap();
        assert_eq!(session.user.id, "8d0f3c1e-user");
        assert_eq!(session.user.email.as_deref(), Some("patient@example.com"));
        assert_eq!(session.user.phone, None);
        assert_eq!(session.refresh_token, "r-123");
        assert_eq!(session.expires_at, Some(4102444800));
        assert!(!session.is_expired());
    }

    #[test]
    fn redirect_errors_are_reported() {
        let err = Session::from_redirect_url(
            "https://bagreedx.com/#error=access_denied&error_description=Email+link+is+invalid+or+has+expired",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Authentication error: Email link is invalid or has expired");

        assert!(Session::from_redirect_url("https://bagreedx.com/").is_err());
    }

    #[test]
    fn expired_sessions_are_detected() {
        let user = User { id: "u1".into(), email: None, phone: None };
        let mut session = Session::new("a".into(), "r".into(), user, 3600);
        assert!(!session.is_expired());
        session.expires_at = Some(0);
        assert!(session.is_expired());
    }
}
