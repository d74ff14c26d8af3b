//! Table access through the PostgREST API

mod query;

use reqwest::Client;
use serde::Serialize;

pub use query::*;
use query::Target;

/// Client for one table or view
pub struct TableClient {
    /// The base URL for the Supabase project
    url: String,

    /// The anonymous API key for the Supabase project
    key: String,

    /// The table or view name
    table: String,

    /// User access token sent as bearer
    token: Option<String>,

    /// HTTP client
    client: Client,
}

impl TableClient {
    /// Create a new TableClient
    pub(crate) fn new(url: &str, key: &str, table: &str, client: Client) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            table: table.to_string(),
            token: None,
            client,
        }
    }

    /// Run requests as the user owning this access token
    pub fn with_auth(mut self, token: Option<&str>) -> Self {
        self.token = token.map(str::to_string);
        self
    }

    /// Name of the table
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Get the base URL for REST API requests
    fn get_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url, self.table)
    }

    fn target(&self) -> Target {
        Target {
            url: self.get_url(),
            key: self.key.clone(),
            token: self.token.clone(),
            client: self.client.clone(),
        }
    }

    /// Select specific columns from the table
    pub fn select(&self, columns: &str) -> SelectBuilder {
        SelectBuilder::new(self.target(), columns)
    }

    /// Insert rows into the table
    pub fn insert<T: Serialize>(&self, values: T) -> InsertBuilder<T> {
        InsertBuilder::new(self.target(), values)
    }

    /// Insert rows, merging into existing ones that collide on `on_conflict`
    pub fn upsert<T: Serialize>(&self, values: T, on_conflict: &str) -> InsertBuilder<T> {
        InsertBuilder::new(self.target(), values).on_conflict(on_conflict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_keeps_filter_order() {
        let table = TableClient::new("https://example.supabase.co", "key", "reports", Client::new());
        let query = table
            .select("*")
            .eq("phone", "9876543210")
            .order("created_at", false);

        let params: Vec<(&str, &str)> = query
            .params()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            params,
            vec![
                ("select", "*"),
                ("phone", "eq.9876543210"),
                ("order", "created_at.desc"),
            ]
        );
        assert_eq!(table.table(), "reports");
    }
}
