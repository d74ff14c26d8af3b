//! Appointment and home-collection booking

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::catalog::Service;
use crate::error::Error;
use crate::fetch::Fetch;

/// Shown when a required field is empty
pub const MSG_MISSING_FIELDS: &str = "Please fill name, phone and date.";

/// Shown when the booking could not be delivered
pub const MSG_BOOKING_FAILED: &str = "Failed to book — save data locally and try again.";

/// The booking as sent to the backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingRequest {
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    pub test: String,
}

#[derive(Debug, Deserialize)]
struct BookingResponse {
    #[serde(rename = "ref", default)]
    reference: Option<serde_json::Value>,
}

/// Confirmation of an accepted booking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingReceipt {
    /// Reference issued by the backend, `NA` when it sent none
    pub reference: String,
}

impl BookingReceipt {
    pub fn message(&self) -> String {
        format!("Booking confirmed. Reference: {}", self.reference)
    }
}

/// Form state of the booking section
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingForm {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub date: String,
    pub time: String,
    pub test: String,

    /// Last message shown under the form
    pub message: String,
}

impl BookingForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-fill the test from a catalog entry
    pub fn select_service(&mut self, service: &Service) {
        self.test = service.name.to_string();
    }

    /// Check the required fields; no format checks are made
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.is_empty() || self.phone.is_empty() || self.date.is_empty() {
            return Err(Error::validation(MSG_MISSING_FIELDS));
        }
        Ok(())
    }

    /// Snapshot of the fields as a request
    pub fn to_request(&self) -> BookingRequest {
        BookingRequest {
            name: self.name.clone(),
            phone: self.phone.clone(),
            email: non_empty(&self.email),
            date: self.date.clone(),
            time: non_empty(&self.time),
            test: self.test.clone(),
        }
    }

    /// Clear every field, keeping the message
    pub fn reset(&mut self) {
        let message = std::mem::take(&mut self.message);
        *self = Self { message, ..Self::default() };
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Sends bookings to the booking backend
pub struct BookingClient {
    /// Absolute URL of the booking endpoint
    endpoint: String,

    /// HTTP client
    client: Client,
}

impl BookingClient {
    pub(crate) fn new(endpoint: &str, client: Client) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            client,
        }
    }

    /// Validate and send the form.
    ///
    /// The form's message is updated on every path. On success all fields are
    /// cleared; on failure they are left as typed. Nothing is retried.
    pub async fn submit(&self, form: &mut BookingForm) -> Result<BookingReceipt, Error> {
        if let Err(err) = form.validate() {
            form.message = err.to_string();
            return Err(err);
        }

        match self.send(&form.to_request()).await {
            Ok(receipt) => {
                log::info!("Booking confirmed with reference {}", receipt.reference);
                form.message = receipt.message();
                form.reset();
                Ok(receipt)
            }
            Err(err) => {
                log::error!("Booking failed: {}", err);
                form.message = MSG_BOOKING_FAILED.to_string();
                Err(err)
            }
        }
    }

    async fn send(&self, request: &BookingRequest) -> Result<BookingReceipt, Error> {
        let response = Fetch::post(&self.client, &self.endpoint)
            .json(request)?
            .execute::<BookingResponse>()
            .await?;

        Ok(BookingReceipt {
            reference: reference_or_na(response.reference),
        })
    }
}

/// The backend's ref as shown to the user; empty, zero, boolean or missing refs read `NA`
fn reference_or_na(reference: Option<serde_json::Value>) -> String {
    match reference {
        Some(serde_json::Value::String(s)) if !s.is_empty() => s,
        Some(serde_json::Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
        _ => "NA".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn filled() -> BookingForm {
        BookingForm {
            name: "Asha".into(),
            phone: "9876543210".into(),
            date: "2024-01-01".into(),
            ..BookingForm::default()
        }
    }

    #[test]
    fn required_fields_are_checked() {
        assert!(filled().validate().is_ok());

        for clear in [0, 1, 2] {
            let mut form = filled();
            match clear {
                0 => form.name.clear(),
                1 => form.phone.clear(),
                _ => form.date.clear(),
            }
            let err = form.validate().unwrap_err();
            assert_eq!(err.to_string(), MSG_MISSING_FIELDS);
        }
    }

    #[test]
    fn optional_fields_are_omitted_when_empty() {
        let mut form = filled();
        form.select_service(Catalog::sample().find(3).unwrap());

        let body = serde_json::to_value(form.to_request()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "name": "Asha",
                "phone": "9876543210",
                "date": "2024-01-01",
                "test": "Lipid Profile"
            })
        );
    }

    #[test]
    fn reset_keeps_the_message() {
        let mut form = filled();
        form.message = "Booking confirmed. Reference: BDC-1".into();
        form.reset();
        assert_eq!(form, BookingForm { message: "Booking confirmed. Reference: BDC-1".into(), ..BookingForm::default() });
    }

    #[test]
    fn falsy_references_read_na() {
        use serde_json::json;

        assert_eq!(reference_or_na(Some(json!("BDC-7"))), "BDC-7");
        assert_eq!(reference_or_na(Some(json!(1042))), "1042");
        for falsy in [json!(0), json!(""), json!(false), json!(true), json!(null)] {
            assert_eq!(reference_or_na(Some(falsy)), "NA");
        }
        assert_eq!(reference_or_na(None), "NA");
    }
}
