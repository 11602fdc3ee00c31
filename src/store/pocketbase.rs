//! PocketBase REST implementation of [`RecordStore`].

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{Filter, Record, RecordStore, StoreError};

/// Largest page the store will hand out per list request.
const MAX_PAGE_SIZE: usize = 500;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL, e.g. `http://127.0.0.1:8090`.
    pub url: String,
    /// Superuser/service token sent as `Authorization`.
    pub token: Option<String>,
    /// Auth collection staff users sign in to, e.g. `users`.
    pub auth_collection: String,
}

pub struct PocketBaseStore {
    config: StoreConfig,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    items: Vec<Record>,
}

#[derive(Deserialize)]
struct AuthResponse {
    record: Record,
}

impl PocketBaseStore {
    pub fn new(config: StoreConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn records_url(&self, collection: &str) -> String {
        format!(
            "{}/api/collections/{}/records",
            self.config.url.trim_end_matches('/'),
            collection
        )
    }

    fn auth_refresh_url(&self) -> String {
        format!(
            "{}/api/collections/{}/auth-refresh",
            self.config.url.trim_end_matches('/'),
            self.config.auth_collection
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => request.header(reqwest::header::AUTHORIZATION, token),
            None => request,
        }
    }

    async fn read_record(response: reqwest::Response) -> Result<Record, StoreError> {
        let response = check_status(response).await?;
        response
            .json::<Record>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl RecordStore for PocketBaseStore {
    async fn find_records(
        &self,
        collection: &str,
        filter: Option<&Filter>,
        sort: &str,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        let expression = filter.map(Filter::to_expression).unwrap_or_default();
        let mut records = Vec::new();
        let mut page = 1usize;

        while records.len() < limit {
            let per_page = (limit - records.len()).min(MAX_PAGE_SIZE);
            let mut query: Vec<(&str, String)> = vec![
                ("page", page.to_string()),
                ("perPage", per_page.to_string()),
                ("skipTotal", "1".to_string()),
            ];
            if !expression.is_empty() {
                query.push(("filter", expression.clone()));
            }
            if !sort.is_empty() {
                query.push(("sort", sort.to_string()));
            }

            log::debug!("Listing {} page {} (filter: {})", collection, page, expression);
            let request = self.client.get(self.records_url(collection)).query(&query);
            let response = self
                .authorize(request)
                .send()
                .await
                .map_err(StoreError::Http)?;
            let response = check_status(response).await?;
            let list: ListResponse = response
                .json()
                .await
                .map_err(|e| StoreError::Decode(e.to_string()))?;

            let fetched = list.items.len();
            records.extend(list.items);
            if fetched < per_page {
                break;
            }
            page += 1;
        }

        records.truncate(limit);
        Ok(records)
    }

    async fn create_record(
        &self,
        collection: &str,
        fields: Map<String, Value>,
    ) -> Result<Record, StoreError> {
        let request = self
            .client
            .post(self.records_url(collection))
            .json(&Value::Object(fields));
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(StoreError::Http)?;
        Self::read_record(response).await
    }

    async fn update_record(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Record, StoreError> {
        let url = format!("{}/{}", self.records_url(collection), id);
        let request = self.client.patch(url).json(&Value::Object(fields));
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(StoreError::Http)?;
        Self::read_record(response).await
    }

    async fn authenticate(&self, token: &str) -> Result<Record, StoreError> {
        // Sent with the caller's token, never the service token.
        let response = self
            .client
            .post(self.auth_refresh_url())
            .header(reqwest::header::AUTHORIZATION, token)
            .send()
            .await
            .map_err(StoreError::Http)?;
        let response = check_status(response).await?;
        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(auth.record)
    }
}
