//! Query builders for TableClient

use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::Error;
use crate::fetch::{Fetch, FetchBuilder};

/// Where a builder sends its request, and as whom
#[derive(Clone)]
pub(crate) struct Target {
    /// The REST URL of the table
    pub(crate) url: String,

    /// The API key
    pub(crate) key: String,

    /// User access token; the API key is used as bearer when absent
    pub(crate) token: Option<String>,

    /// HTTP client
    pub(crate) client: Client,
}

impl Target {
    fn authorize<'a>(&self, fetch: FetchBuilder<'a>) -> FetchBuilder<'a> {
        fetch
            .api_key(&self.key)
            .bearer_auth(self.token.as_deref().unwrap_or(&self.key))
    }
}

/// Builder for SELECT queries
pub struct SelectBuilder {
    target: Target,

    /// Query parameters, in the order they were added
    params: Vec<(String, String)>,
}

impl SelectBuilder {
    pub(crate) fn new(target: Target, columns: &str) -> Self {
        Self {
            target,
            params: vec![("select".to_string(), columns.to_string())],
        }
    }

    fn filter(mut self, column: &str, operator: &str, value: &str) -> Self {
        self.params
            .push((column.to_string(), format!("{}.{}", operator, value)));
        self
    }

    /// Filter rows where column equals a value
    pub fn eq<T: ToString>(self, column: &str, value: T) -> Self {
        self.filter(column, "eq", &value.to_string())
    }

    /// Order the results by a column
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.params
            .push(("order".to_string(), format!("{}.{}", column, direction)));
        self
    }

    /// Limit the number of rows returned
    pub fn limit(mut self, count: u32) -> Self {
        self.params.push(("limit".to_string(), count.to_string()));
        self
    }

    /// Query parameters as they will be sent
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Execute the query and return the results
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<Vec<T>, Error> {
        let fetch = self
            .target
            .authorize(Fetch::get(&self.target.client, &self.target.url))
            .query(self.params.clone());

        fetch.execute::<Vec<T>>().await
    }

    /// Execute the query and return the first row
    pub async fn execute_one<T: DeserializeOwned>(self) -> Result<Option<T>, Error> {
        let rows = self.limit(1).execute::<T>().await?;
        Ok(rows.into_iter().next())
    }
}

/// Builder for INSERT queries; with a conflict target it becomes an upsert
pub struct InsertBuilder<T: Serialize> {
    target: Target,

    /// The rows to write
    values: T,

    /// Merge into existing rows matching these columns instead of failing
    on_conflict: Option<String>,
}

impl<T: Serialize> InsertBuilder<T> {
    pub(crate) fn new(target: Target, values: T) -> Self {
        Self {
            target,
            values,
            on_conflict: None,
        }
    }

    /// Specify the column(s) to check for conflicts
    pub fn on_conflict(mut self, columns: &str) -> Self {
        self.on_conflict = Some(columns.to_string());
        self
    }

    fn prefer(&self) -> &'static str {
        if self.on_conflict.is_some() {
            "resolution=merge-duplicates,return=representation"
        } else {
            "return=representation"
        }
    }

    /// Execute the write and return the stored rows
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<Vec<R>, Error> {
        let mut fetch = self
            .target
            .authorize(Fetch::post(&self.target.client, &self.target.url))
            .header("Prefer", self.prefer());

        if let Some(columns) = &self.on_conflict {
            fetch = fetch.query([("on_conflict", columns.as_str())]);
        }

        fetch.json(&self.values)?.execute::<Vec<R>>().await
    }
}
