use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::application::ports::{VectorIndex, VectorIndexError, VectorRecord};
use crate::application::ports::vector_index::MAX_UPSERT_BATCH;
use crate::domain::value_objects::Namespace;

const API_VERSION: &str = "2025-01";

#[derive(Debug, Clone)]
pub struct PineconeConfig {
    pub index_host: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

/// Record shape of an integrated-embedding index; the index embeds `text` itself.
#[derive(Serialize)]
struct UpsertRecord<'a> {
    #[serde(rename = "_id")]
    id: &'a str,
    text: &'a str,
    page: i32,
}

#[derive(Deserialize)]
struct IndexStats {
    #[serde(default)]
    namespaces: HashMap<String, serde_json::Value>,
}

pub struct PineconeIndex {
    client: Client,
    config: PineconeConfig,
}

impl PineconeIndex {
    pub fn new(config: PineconeConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        let host = self.config.index_host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}/{}", host, path)
        } else {
            format!("https://{}/{}", host, path)
        }
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .header("Api-Key", &self.config.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }
}

fn network_error(e: reqwest::Error) -> VectorIndexError {
    VectorIndexError::NetworkError(e.without_url().to_string())
}

async fn api_error(response: reqwest::Response) -> VectorIndexError {
    let status = response.status().as_u16();
    VectorIndexError::ApiError {
        status,
        message: response.text().await.unwrap_or_default(),
    }
}

pub fn to_ndjson(records: &[VectorRecord]) -> Result<String, VectorIndexError> {
    let mut body = String::new();
    for record in records {
        let line = serde_json::to_string(&UpsertRecord {
            id: &record.id,
            text: &record.text,
            page: record.page,
        })
        .map_err(|e| VectorIndexError::EmbeddingError(e.to_string()))?;
        body.push_str(&line);
        body.push('\n');
    }
    Ok(body)
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(
        &self,
        namespace: &Namespace,
        records: &[VectorRecord],
    ) -> Result<usize, VectorIndexError> {
        if records.len() > MAX_UPSERT_BATCH {
            return Err(VectorIndexError::BatchTooLarge {
                size: records.len(),
                max: MAX_UPSERT_BATCH,
            });
        }
        if records.is_empty() {
            return Ok(0);
        }

        let response = self
            .post(&format!("records/namespaces/{}/upsert", namespace))
            .header("Content-Type", "application/x-ndjson")
            .body(to_ndjson(records)?)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        debug!(namespace = %namespace, count = records.len(), "records upserted");
        Ok(records.len())
    }

    async fn delete_namespace(&self, namespace: &Namespace) -> Result<(), VectorIndexError> {
        let response = self
            .post("vectors/delete")
            .json(&serde_json::json!({ "deleteAll": true, "namespace": namespace.as_str() }))
            .send()
            .await
            .map_err(network_error)?;

        // deleting a namespace that was never written is not an error
        if response.status().is_success() || response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(api_error(response).await)
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, VectorIndexError> {
        let response = self
            .post("describe_index_stats")
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let stats: IndexStats = response
            .json()
            .await
            .map_err(|e| VectorIndexError::ApiError {
                status: 200,
                message: format!("Invalid index stats: {}", e),
            })?;

        Ok(stats
            .namespaces
            .into_keys()
            .filter_map(|name| Namespace::new(name).ok())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ndjson_body() {
        let records = vec![
            VectorRecord {
                id: "c1".to_string(),
                text: "first \"quoted\"".to_string(),
                page: 1,
            },
            VectorRecord {
                id: "c2".to_string(),
                text: "second".to_string(),
                page: 3,
            },
        ];

        let body = to_ndjson(&records).unwrap();
        let lines: Vec<&str> = body.lines().collect();

        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["_id"], "c1");
        assert_eq!(first["text"], "first \"quoted\"");
        assert_eq!(first["page"], 1);
    }

    #[test]
    fn test_host_without_scheme() {
        let index = PineconeIndex::new(PineconeConfig {
            index_host: "papers-abc.svc.pinecone.io/".to_string(),
            api_key: "k".to_string(),
            timeout_secs: 5,
        })
        .unwrap();

        assert_eq!(
            index.url("describe_index_stats"),
            "https://papers-abc.svc.pinecone.io/describe_index_stats"
        );
    }
}
