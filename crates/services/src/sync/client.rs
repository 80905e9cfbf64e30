#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::time::Duration;

use knowledge_core_core::config::SyncConfig;
use knowledge_core_core::error::{Error, Result};

/// One row of a remote table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirtableRecord {
    pub id: String,
    #[serde(rename = "createdTime", default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub fields: JsonValue,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    records: Vec<AirtableRecord>,
    #[serde(default)]
    offset: Option<String>,
}

/// Thin REST client for the Airtable record API
pub struct AirtableClient {
    http: Client,
    base_url: Url,
}

impl AirtableClient {
    /// Build a client from the sync configuration.
    ///
    /// # Errors
    /// Returns a configuration error when the API key is missing or the API
    /// URL does not parse
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("Airtable API key not configured".to_string()))?;

        let mut headers = reqwest::header::HeaderMap::new();
        let mut auth = reqwest::header::HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| Error::Config("Airtable API key is not a valid header".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let http = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        let base_url = Url::parse(&format!(
            "{}/{}/",
            config.api_url.trim_end_matches('/'),
            config.base_id
        ))
        .map_err(|e| Error::Config(format!("Invalid Airtable API URL: {e}")))?;

        Ok(Self { http, base_url })
    }

    fn table_url(&self, table: &str) -> Result<Url> {
        // join() percent-encodes the table name (they usually contain spaces)
        self.base_url
            .join(&urlencode(table))
            .map_err(|e| Error::Remote(format!("Invalid table name '{table}': {e}")))
    }

    /// Fetch all rows of a table, following offset pagination.
    ///
    /// # Errors
    /// Returns a remote error on any non-success response
    pub async fn list_records(&self, table: &str) -> Result<Vec<AirtableRecord>> {
        let url = self.table_url(table)?;
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut request = self.http.get(url.clone());
            if let Some(offset) = &offset {
                request = request.query(&[("offset", offset.as_str())]);
            }

            let response = request.send().await?;
            let page: ListResponse = Self::parse(response).await?;

            records.extend(page.records);
            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        Ok(records)
    }

    /// Create a row; the remote-assigned id comes back on the record.
    ///
    /// # Errors
    /// Returns a remote error on any non-success response
    pub async fn create_record(&self, table: &str, fields: &JsonValue) -> Result<AirtableRecord> {
        let response = self
            .http
            .post(self.table_url(table)?)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        Self::parse(response).await
    }

    /// Update an existing row by its remote id.
    ///
    /// # Errors
    /// Returns a remote error on any non-success response
    pub async fn update_record(
        &self,
        table: &str,
        record_id: &str,
        fields: &JsonValue,
    ) -> Result<AirtableRecord> {
        let mut url = self.table_url(table)?;
        url.path_segments_mut()
            .map_err(|()| Error::Remote("Airtable URL cannot be a base".to_string()))?
            .push(record_id);

        let response = self
            .http
            .patch(url)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn parse<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote(format!(
                "Airtable returned {status}: {body}"
            )));
        }
        Ok(response.json::<T>().await?)
    }
}

fn urlencode(segment: &str) -> String {
    // Only the characters that actually appear in table names need escaping
    segment.replace('%', "%25").replace(' ', "%20").replace('/', "%2F")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_requires_api_key() {
        let config = SyncConfig::default();
        assert!(AirtableClient::new(&config).is_err());
    }

    #[test]
    fn test_table_url_encodes_spaces() {
        let config = SyncConfig {
            api_key: Some("pat123".to_string()),
            ..SyncConfig::default()
        };
        let client = AirtableClient::new(&config).unwrap();
        let url = client.table_url("Strategic Knowledge").unwrap();
        assert!(url.as_str().ends_with("/appBOVJqGE166onrD/Strategic%20Knowledge"));
    }
}
