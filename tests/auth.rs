use jsonwebtoken::{encode, EncodingKey, Header};
use labdesk::auth::{AuthEvent, NOTICE_ENTER_EMAIL};
use labdesk::config::LabOptions;
use labdesk::error::Error;
use labdesk::LabDesk;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn desk(server: &MockServer, options: LabOptions) -> LabDesk {
    LabDesk::new_with_options(&server.uri(), "anon-key", options).unwrap()
}

fn session_json() -> Value {
    json!({
        "access_token": "user-token",
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "refresh-token",
        "user": { "id": "user-9", "email": "asha@example.com" }
    })
}

#[tokio::test]
async fn magic_link_carries_the_redirect() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/otp"))
        .and(query_param("redirect_to", "https://bagreedx.com/reports"))
        .and(header("apikey", "anon-key"))
        .and(body_json(json!({ "email": "asha@example.com", "create_user": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let desk = desk(&server, LabOptions::default());
    desk.auth()
        .send_magic_link(" asha@example.com ", Some("https://bagreedx.com/reports"))
        .await
        .unwrap();

    let err = desk.auth().send_magic_link("", None).await.unwrap_err();
    assert_eq!(err.to_string(), NOTICE_ENTER_EMAIL);
}

#[tokio::test]
async fn email_code_signs_in() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/verify"))
        .and(body_json(json!({ "email": "asha@example.com", "token": "654321", "type": "email" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_json()))
        .expect(1)
        .mount(&server)
        .await;

    let desk = desk(&server, LabOptions::default());
    let mut events = desk.auth().on_auth_state_change();

    let session = desk.auth().verify_email_otp("asha@example.com", "654321").await.unwrap();
    assert_eq!(session.user.id, "user-9");
    assert_eq!(desk.auth().access_token().as_deref(), Some("user-token"));
    assert!(matches!(events.try_recv(), Ok(AuthEvent::SignedIn(_))));
}

#[tokio::test]
async fn oauth_code_is_exchanged() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "authorization_code"))
        .and(body_json(json!({ "code": "callback-code" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_json()))
        .expect(1)
        .mount(&server)
        .await;

    let desk = desk(&server, LabOptions::default());
    let session = desk.auth().exchange_code_for_session("callback-code").await.unwrap();
    assert_eq!(session.refresh_token, "refresh-token");
}

#[tokio::test]
async fn redirect_fragment_becomes_a_session() {
    let server = MockServer::start().await;
    let desk = desk(&server, LabOptions::default());
    let mut events = desk.auth().on_auth_state_change();

    let token = encode(
        &Header::default(),
        &json!({ "sub": "user-3", "email": "ravi@example.com", "phone": "", "exp": 4102444800i64 }),
        &EncodingKey::from_secret(b"not-the-project-secret"),
    )
    .unwrap();
    let redirect = format!(
        "https://bagreedx.com/#access_token={}&refresh_token=r3&expires_in=3600&token_type=bearer",
        token
    );

    let session = desk.auth().session_from_redirect(&redirect).unwrap();
    assert_eq!(session.user.id, "user-3");
    assert_eq!(session.user.email.as_deref(), Some("ravi@example.com"));
    assert_eq!(session.user.phone, None);
    assert!(matches!(events.try_recv(), Ok(AuthEvent::SignedIn(_))));

    let err = desk
        .auth()
        .session_from_redirect("https://bagreedx.com/#error=access_denied&error_description=Email+link+is+invalid")
        .unwrap_err();
    assert_eq!(err.to_string(), "Authentication error: Email link is invalid");
    assert!(matches!(events.try_recv(), Ok(AuthEvent::SignInFailed(_))));
}

#[tokio::test]
async fn sessions_are_not_kept_when_persistence_is_off() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_json()))
        .mount(&server)
        .await;

    let desk = desk(&server, LabOptions::default().with_persist_session(false));
    let mut events = desk.auth().on_auth_state_change();

    desk.auth().verify_phone_otp("9876543210", "123456").await.unwrap();
    assert!(desk.auth().get_session().is_none());
    assert!(matches!(events.try_recv(), Ok(AuthEvent::SignedIn(_))));

    let err = desk.auth().sign_out().await.unwrap_err();
    assert!(matches!(err, Error::NotAuthenticated));
}
