//! Company research: a two-step pass-through to a RapidAPI company data
//! service. Search by name, take the first hit, return its reviews payload
//! untouched. Each request is made once; there is no retry.

pub mod handlers;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_COMPANY_API_HOST: &str = "real-time-glassdoor-data.p.rapidapi.com";

#[derive(Debug, Error)]
pub enum CompanyError {
    #[error("company research is not configured (RAPIDAPI_KEY is unset)")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("company API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("company not found: {0}")]
    NotFound(String),

    #[error("no details found for company {0}")]
    NoDetails(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyReport {
    pub company_name: String,
    pub company_id: String,
    /// Raw `data` payload of the reviews endpoint.
    pub details: Value,
}

#[async_trait]
pub trait CompanyResearcher: Send + Sync {
    async fn research(&self, company_name: &str) -> Result<CompanyReport, CompanyError>;
}

pub struct RapidApiResearcher {
    client: Client,
    api_key: String,
    host: String,
    base_url: String,
}

impl RapidApiResearcher {
    pub fn new(client: Client, api_key: String, host: String) -> Self {
        let base_url = format!("https://{host}");
        Self {
            client,
            api_key,
            host,
            base_url,
        }
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, CompanyError> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.host)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CompanyError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl CompanyResearcher for RapidApiResearcher {
    async fn research(&self, company_name: &str) -> Result<CompanyReport, CompanyError> {
        let search = self.get("/company/search", &[("query", company_name)]).await?;
        let company_id = first_company_id(&search)
            .ok_or_else(|| CompanyError::NotFound(company_name.to_string()))?;
        debug!("Company '{company_name}' resolved to id {company_id}");

        let reviews = self
            .get("/company/reviews", &[("id", company_id.as_str())])
            .await?;
        let details = reviews_payload(reviews)
            .ok_or_else(|| CompanyError::NoDetails(company_name.to_string()))?;
        info!("Fetched company details for '{company_name}'");

        Ok(CompanyReport {
            company_name: company_name.to_string(),
            company_id,
            details,
        })
    }
}

/// `id` of the first entry in a search response's `data` array. Ids arrive
/// as strings or numbers depending on the record.
pub fn first_company_id(search: &Value) -> Option<String> {
    match search.get("data")?.as_array()?.first()?.get("id")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// The reviews response's `data` payload, unless it is missing or empty.
pub fn reviews_payload(mut reviews: Value) -> Option<Value> {
    let data = reviews.get_mut("data")?.take();
    let empty = match &data {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    };
    (!empty).then_some(data)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_first_company_id_accepts_string_and_number_ids() {
        let search = json!({"data": [{"id": "E1234", "name": "Initech"}, {"id": "E9"}]});
        assert_eq!(first_company_id(&search).as_deref(), Some("E1234"));

        let numeric = json!({"data": [{"id": 4242}]});
        assert_eq!(first_company_id(&numeric).as_deref(), Some("4242"));
    }

    #[test]
    fn test_first_company_id_of_empty_search_is_none() {
        assert_eq!(first_company_id(&json!({"data": []})), None);
        assert_eq!(first_company_id(&json!({"status": "OK"})), None);
        assert_eq!(first_company_id(&json!({"data": [{"id": ""}]})), None);
    }

    #[test]
    fn test_reviews_payload_passes_data_through() {
        let payload = json!({"rating": 4.1, "reviews": [{"summary": "Good team"}]});
        let reviews = json!({"status": "OK", "data": payload.clone()});
        assert_eq!(reviews_payload(reviews), Some(payload));
    }

    #[test]
    fn test_reviews_payload_rejects_empty_data() {
        assert_eq!(reviews_payload(json!({"data": null})), None);
        assert_eq!(reviews_payload(json!({"data": {}})), None);
        assert_eq!(reviews_payload(json!({"data": []})), None);
        assert_eq!(reviews_payload(json!({})), None);
    }

    #[test]
    fn test_base_url_follows_host() {
        let researcher = RapidApiResearcher::new(
            Client::new(),
            "key".to_string(),
            DEFAULT_COMPANY_API_HOST.to_string(),
        );
        assert_eq!(
            researcher.base_url,
            format!("https://{DEFAULT_COMPANY_API_HOST}")
        );
    }
}
