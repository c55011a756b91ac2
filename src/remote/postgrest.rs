//! [`RemoteApi`] over a PostgREST endpoint (`{base}/rest/v1/{table}`).

use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;
use talebedu_config::RemoteConfig;
use talebedu_models::Collection;
use tracing::debug;

use super::{RemoteApi, RemoteError, RemoteFuture, RemoteQuery};

#[derive(Clone)]
pub struct PostgrestClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for PostgrestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgrestClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[redacted]")
            .finish()
    }
}

impl PostgrestClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    /// Builds a client from configuration, or `None` when no base URL is set.
    pub fn from_config(config: &RemoteConfig) -> Result<Option<Self>, reqwest::Error> {
        config
            .base_url
            .as_deref()
            .map(|url| Self::new(url, config.api_key.clone(), config.timeout))
            .transpose()
    }

    fn table_url(&self, collection: Collection) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection.table())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| RemoteError::unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::from_status(status.as_u16(), error_message(&body)))
    }

    async fn rows(response: Response) -> Result<Vec<Value>, RemoteError> {
        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| RemoteError::unavailable(format!("Invalid response body: {e}")))
    }
}

/// Query string for a select, in PostgREST syntax.
fn select_params(query: &RemoteQuery) -> Vec<(String, String)> {
    let mut params = vec![(
        "select".to_string(),
        query.columns.clone().unwrap_or_else(|| "*".to_string()),
    )];

    params.extend(
        query
            .filters
            .iter()
            .map(|(column, value)| (column.clone(), format!("eq.{value}"))),
    );

    if let Some(order) = &query.order {
        let direction = if order.ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{}.{direction}", order.column)));
    }

    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }

    params
}

/// PostgREST error bodies are JSON with a `message` field; anything else is
/// passed through as text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

impl RemoteApi for PostgrestClient {
    fn select<'a>(
        &'a self,
        collection: Collection,
        query: &'a RemoteQuery,
    ) -> RemoteFuture<'a, Vec<Value>> {
        Box::pin(async move {
            let request = self
                .client
                .get(self.table_url(collection))
                .query(&select_params(query));
            let rows = Self::rows(self.send(request).await?).await?;

            debug!(remote.table = collection.table(), remote.rows = rows.len(), "Remote select");

            Ok(rows)
        })
    }

    fn insert<'a>(&'a self, collection: Collection, record: &'a Value) -> RemoteFuture<'a, Value> {
        Box::pin(async move {
            let request = self
                .client
                .post(self.table_url(collection))
                .header("Prefer", "return=representation")
                .json(record);
            let rows = Self::rows(self.send(request).await?).await?;
            debug!(remote.table = collection.table(), "Remote insert");

            // No representation means the row is not readable back; keep what was sent.
            Ok(rows.into_iter().next().unwrap_or_else(|| record.clone()))
        })
    }

    fn update<'a>(
        &'a self,
        collection: Collection,
        id: &'a str,
        patch: &'a Value,
    ) -> RemoteFuture<'a, Value> {
        Box::pin(async move {
            let request = self
                .client
                .patch(self.table_url(collection))
                .query(&[("id", format!("eq.{id}"))])
                .header("Prefer", "return=representation")
                .json(patch);
            let rows = Self::rows(self.send(request).await?).await?;
            debug!(remote.table = collection.table(), remote.id = %id, "Remote update");

            rows.into_iter()
                .next()
                .ok_or_else(|| RemoteError::rejected(404, format!("No row with id {id}")))
        })
    }

    fn delete<'a>(&'a self, collection: Collection, id: &'a str) -> RemoteFuture<'a, ()> {
        Box::pin(async move {
            let request = self
                .client
                .delete(self.table_url(collection))
                .query(&[("id", format!("eq.{id}"))]);
            self.send(request).await?;
            debug!(remote.table = collection.table(), remote.id = %id, "Remote delete");

            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_params_default() {
        assert_eq!(
            select_params(&RemoteQuery::all()),
            vec![("select".to_string(), "*".to_string())]
        );
    }

    #[test]
    fn test_select_params_full() {
        let query = RemoteQuery::all()
            .columns("id,amount")
            .eq("status", "pending")
            .order_by("due_date", false)
            .limit(5);

        assert_eq!(
            select_params(&query),
            vec![
                ("select".to_string(), "id,amount".to_string()),
                ("status".to_string(), "eq.pending".to_string()),
                ("order".to_string(), "due_date.desc".to_string()),
                ("limit".to_string(), "5".to_string()),
            ]
        );
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"code":"23505","message":"duplicate key"}"#),
            "duplicate key"
        );
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = PostgrestClient::new("http://localhost/", "secret", Duration::from_secs(1)).unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("http://localhost\""));
    }
}
