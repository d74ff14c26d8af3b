use labdesk::booking::{BookingForm, MSG_BOOKING_FAILED, MSG_MISSING_FIELDS};
use labdesk::config::LabOptions;
use labdesk::error::ErrorKind;
use labdesk::LabDesk;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn desk(server: &MockServer) -> LabDesk {
    let options = LabOptions::default().with_site_url(&server.uri());
    LabDesk::new_with_options("https://project.supabase.co", "anon-key", options).unwrap()
}

fn form() -> BookingForm {
    BookingForm {
        name: "Asha Verma".into(),
        phone: "9876543210".into(),
        date: "2024-03-01".into(),
        time: "08:30".into(),
        ..BookingForm::default()
    }
}

#[tokio::test]
async fn confirmed_booking_clears_the_form() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/book-appointment"))
        .and(body_json(json!({
            "name": "Asha Verma",
            "phone": "9876543210",
            "date": "2024-03-01",
            "time": "08:30",
            "test": "Thyroid Profile (T3,T4,TSH)"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "ref": "BDC-1042" })))
        .expect(1)
        .mount(&server)
        .await;

    let desk = desk(&server);
    let mut form = form();
    let thyroid = desk.catalog().search("thyroid")[0];
    form.select_service(thyroid);

    let receipt = desk.booking().submit(&mut form).await.unwrap();

    assert_eq!(receipt.reference, "BDC-1042");
    assert_eq!(form.message, "Booking confirmed. Reference: BDC-1042");
    assert!(form.name.is_empty());
    assert!(form.phone.is_empty());
    assert!(form.test.is_empty());
}

#[tokio::test]
async fn numeric_or_missing_references() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/book-appointment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ref": 77 })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/book-appointment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let desk = desk(&server);

    let mut first = form();
    assert_eq!(desk.booking().submit(&mut first).await.unwrap().reference, "77");

    let mut second = form();
    desk.booking().submit(&mut second).await.unwrap();
    assert_eq!(second.message, "Booking confirmed. Reference: NA");
}

#[tokio::test]
async fn missing_phone_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let desk = desk(&server);
    let mut form = BookingForm {
        name: "A".into(),
        date: "2024-01-01".into(),
        ..BookingForm::default()
    };

    let err = desk.booking().submit(&mut form).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(form.message, MSG_MISSING_FIELDS);
    assert_eq!(form.name, "A");
}

#[tokio::test]
async fn server_error_keeps_the_fields() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/book-appointment"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(1)
        .mount(&server)
        .await;

    let desk = desk(&server);
    let mut form = form();

    let err = desk.booking().submit(&mut form).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Service);
    assert_eq!(form.message, MSG_BOOKING_FAILED);
    assert_eq!(form.name, "Asha Verma");
    assert_eq!(form.date, "2024-03-01");
}
