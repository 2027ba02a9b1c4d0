//! HTTP client for the ingestion endpoint

use super::traits::IngestionSink;
use crate::config::schema::IngestionConfig;
use crate::domain::{CanonicalRecord, ConnectorError, IngestionError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use std::time::Duration;

/// Longest response body excerpt kept in a rejection error
const MAX_ERROR_BODY: usize = 200;

#[derive(Serialize)]
struct BatchPayload<'a> {
    records: &'a [CanonicalRecord],
}

/// Ingestion client speaking the `{"records": [...]}` protocol
///
/// Every request carries `Authorization: Bearer <api_key>` and the tenant
/// header configured in [`IngestionConfig::tenant_header`].
#[derive(Debug, Clone)]
pub struct IngestionClient {
    client: Client,
    endpoint: String,
}

impl IngestionClient {
    /// Create a new ingestion client
    ///
    /// # Errors
    ///
    /// Returns an error if the credential or tenant cannot be used as header
    /// values, or if the HTTP client cannot be built.
    pub fn new(config: &IngestionConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();

        let mut auth = HeaderValue::from_str(&format!(
            "Bearer {}",
            config.api_key.expose_secret().as_str()
        ))
        .map_err(|e| IngestionError::InvalidRequest(format!("api_key is not a valid header value: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let tenant_header = HeaderName::from_bytes(config.tenant_header.as_bytes())
            .map_err(|e| IngestionError::InvalidRequest(format!("tenant_header: {e}")))?;
        let tenant = HeaderValue::from_str(&config.tenant_id)
            .map_err(|e| IngestionError::InvalidRequest(format!("tenant_id: {e}")))?;
        headers.insert(tenant_header, tenant);

        let client = ClientBuilder::new()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                ConnectorError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl IngestionSink for IngestionClient {
    async fn post_batch(&self, records: &[CanonicalRecord]) -> Result<()> {
        tracing::debug!(endpoint = %self.endpoint, records = records.len(), "Posting batch");

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&BatchPayload { records })
            .send()
            .await
            .map_err(map_transport_error)?;

        match resp.status() {
            StatusCode::OK | StatusCode::CREATED => Ok(()),
            status => {
                let mut body = resp.text().await.unwrap_or_default();
                if body.len() > MAX_ERROR_BODY {
                    let cut = (0..=MAX_ERROR_BODY)
                        .rev()
                        .find(|idx| body.is_char_boundary(*idx))
                        .unwrap_or(0);
                    body.truncate(cut);
                }
                Err(IngestionError::Rejected {
                    status: status.as_u16(),
                    message: body,
                }
                .into())
            }
        }
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn map_transport_error(err: reqwest::Error) -> ConnectorError {
    if err.is_timeout() {
        IngestionError::Timeout(err.to_string()).into()
    } else if err.is_builder() {
        IngestionError::InvalidRequest(err.to_string()).into()
    } else {
        IngestionError::ConnectionFailed(err.to_string()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use crate::domain::{DomainTag, ExternalId, FichaId, Patient, Procedure, Professional, Unit};
    use mockito::Matcher;
    use serde_json::json;

    fn config(endpoint: String) -> IngestionConfig {
        IngestionConfig {
            endpoint,
            api_key: secret_string("key-123".to_string()),
            tenant_id: "3550308".to_string(),
            tenant_header: "X-Municipality-Id".to_string(),
            timeout_seconds: 2,
        }
    }

    fn record(ficha: &str) -> CanonicalRecord {
        CanonicalRecord {
            external_id: ExternalId::from_ficha(&FichaId::new(ficha).unwrap()),
            professional: Professional {
                name: None,
                cns: None,
                occupation_code: None,
            },
            patient: Patient {
                name: None,
                cns: None,
                sex: None,
                cpf: None,
                birth_date: None,
            },
            unit: Unit {
                facility_code: None,
            },
            procedure: Procedure {
                code: None,
                name: None,
                domain: DomainTag::Odontology,
                cid: None,
                ciap: None,
            },
            production_date: None,
        }
    }

    #[tokio::test]
    async fn test_post_batch_sends_headers_and_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/ingestPecData")
            .match_header("authorization", "Bearer key-123")
            .match_header("x-municipality-id", "3550308")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "records": [serde_json::to_value(record("F1")).unwrap()]
            })))
            .with_status(201)
            .create_async()
            .await;

        let client = IngestionClient::new(&config(format!("{}/ingestPecData", server.url()))).unwrap();
        client.post_batch(&[record("F1")]).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_ok_status_is_success() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .create_async()
            .await;

        let client = IngestionClient::new(&config(server.url())).unwrap();
        assert!(client.post_batch(&[record("F1")]).await.is_ok());
    }

    #[tokio::test]
    async fn test_other_status_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(401)
            .with_body("invalid api key")
            .create_async()
            .await;

        let client = IngestionClient::new(&config(server.url())).unwrap();
        let err = client.post_batch(&[record("F1")]).await.unwrap_err();

        match err {
            ConnectorError::Ingestion(IngestionError::Rejected { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid api key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_accepted_is_not_success() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(202)
            .create_async()
            .await;

        let client = IngestionClient::new(&config(server.url())).unwrap();
        assert!(client.post_batch(&[record("F1")]).await.is_err());
    }

    #[tokio::test]
    async fn test_probe_posts_empty_records() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::Json(json!({ "records": [] })))
            .with_status(200)
            .create_async()
            .await;

        let client = IngestionClient::new(&config(server.url())).unwrap();
        client.probe().await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_connection_level() {
        let client = IngestionClient::new(&config("http://127.0.0.1:1/ingest".to_string())).unwrap();
        let err = client.probe().await.unwrap_err();
        assert!(err.is_connection_level(), "unexpected error: {err}");
    }
}
