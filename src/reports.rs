//! Patient reports, linked to profiles by phone number

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::postgrest::TableClient;

/// One row of the reports table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub id: Option<i64>,
    pub phone: String,
    pub file_name: String,
    /// Public download link
    pub url: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// The signed-in patient's report list.
///
/// Every fetch is a full reload; nothing is cached between calls.
pub struct ReportRegistry {
    table: TableClient,
    reports: Vec<Report>,
}

impl ReportRegistry {
    pub fn new(table: TableClient) -> Self {
        Self {
            table,
            reports: Vec::new(),
        }
    }

    /// Replace the list with the reports stored for `phone`, newest first.
    ///
    /// Matching is exact: no trimming, no country-code handling.
    pub async fn fetch(&mut self, phone: &str) -> Result<&[Report], Error> {
        let rows = self
            .table
            .select("*")
            .eq("phone", phone)
            .order("created_at", false)
            .execute::<Report>()
            .await?;

        self.reports = rows.into_iter().filter(|r| r.phone == phone).collect();
        log::debug!("Loaded {} reports", self.reports.len());

        Ok(&self.reports)
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn clear(&mut self) {
        self.reports.clear();
    }

    /// Take over the list loaded by `previous`
    pub(crate) fn carry_over(&mut self, previous: &mut ReportRegistry) {
        self.reports = std::mem::take(&mut previous.reports);
    }
}
