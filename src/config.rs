use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::application::ports::vector_index::MAX_UPSERT_BATCH;
use crate::application::services::{GraphFailurePolicy, IngestionSettings, RetryPolicy};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";
const CHUNKR_API_URL: &str = "https://api.chunkr.ai/api/v1";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

#[derive(Debug, Clone)]
pub struct SegmentationConfig {
    pub api_url: String,
    pub api_key: String,
    pub target_chunk_length: u32,
}

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_url: String,
    pub api_key: String,
    pub metadata_model: String,
    pub reference_model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VectorBackend {
    Pinecone { index_host: String, api_key: String },
    Pgvector { embeddings_url: String },
}

#[derive(Debug, Clone)]
pub struct VectorConfig {
    pub backend: VectorBackend,
    pub batch_size: usize,
}

#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub http_url: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub failure_policy: GraphFailurePolicy,
}

#[derive(Debug, Clone)]
pub struct IngestionConfig {
    pub poll_max_attempts: u32,
    pub poll_base_delay: Duration,
    pub poll_warmup: Duration,
    pub text_byte_budget: usize,
    pub vector_metadata_limit_bytes: usize,
    pub metadata_fallback: bool,
    pub worker_count: usize,
    pub run_timeout: Duration,
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub segmentation: SegmentationConfig,
    pub completion: CompletionConfig,
    pub vector: VectorConfig,
    /// `None` when `GRAPH_ENABLED=false`.
    pub graph: Option<GraphConfig>,
    pub ingestion: IngestionConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);

        let server = ServerConfig {
            port: vars.parsed("PORT", 3000)?,
            body_limit_bytes: vars.parsed("REQUEST_BODY_LIMIT_BYTES", 1024 * 1024)?,
        };

        let database = DatabaseConfig {
            url: vars.required("DATABASE_URL")?,
            pool_size: vars.parsed("DATABASE_POOL_SIZE", 10)?,
        };

        let segmentation = SegmentationConfig {
            api_url: vars.or("CHUNKR_API_URL", CHUNKR_API_URL),
            api_key: vars.required("CHUNKR_API_KEY")?,
            target_chunk_length: vars.parsed("CHUNKR_TARGET_CHUNK_LENGTH", 512)?,
        };

        let completion = CompletionConfig {
            api_url: vars.or("COMPLETION_API_URL", OPENAI_API_URL),
            api_key: vars.required("COMPLETION_API_KEY")?,
            metadata_model: vars.or("METADATA_MODEL", "gpt-4o-mini"),
            reference_model: vars.or("REFERENCE_MODEL", "gpt-4o"),
            timeout: Duration::from_secs(vars.parsed("COMPLETION_TIMEOUT_SECS", 120)?),
        };

        let backend = match vars.or("VECTOR_BACKEND", "pinecone").to_lowercase().as_str() {
            "pinecone" => VectorBackend::Pinecone {
                index_host: vars.required("PINECONE_INDEX_HOST")?,
                api_key: vars.required("PINECONE_API_KEY")?,
            },
            "pgvector" => VectorBackend::Pgvector {
                embeddings_url: vars.required("EMBEDDINGS_SERVICE_URL")?,
            },
            other => {
                return Err(ConfigError::Invalid {
                    key: "VECTOR_BACKEND",
                    value: other.to_string(),
                });
            }
        };
        let batch_size: usize = vars.parsed("VECTOR_BATCH_SIZE", MAX_UPSERT_BATCH)?;
        if batch_size == 0 {
            return Err(ConfigError::Invalid {
                key: "VECTOR_BATCH_SIZE",
                value: "0".to_string(),
            });
        }
        let vector = VectorConfig {
            backend,
            batch_size: batch_size.min(MAX_UPSERT_BATCH),
        };

        let graph = if vars.parsed("GRAPH_ENABLED", true)? {
            Some(GraphConfig {
                http_url: vars.required("NEO4J_HTTP_URL")?,
                user: vars.or("NEO4J_USER", "neo4j"),
                password: vars.required("NEO4J_PASSWORD")?,
                database: vars.or("NEO4J_DATABASE", "neo4j"),
                failure_policy: graph_policy(&vars)?,
            })
        } else {
            None
        };

        let ingestion = IngestionConfig {
            poll_max_attempts: vars.parsed("POLL_MAX_ATTEMPTS", 30)?,
            poll_base_delay: Duration::from_millis(vars.parsed("POLL_BASE_DELAY_MS", 2000)?),
            poll_warmup: Duration::from_millis(vars.parsed("POLL_WARMUP_MS", 10_000)?),
            text_byte_budget: vars.parsed("TEXT_BYTE_BUDGET", 20_000)?,
            vector_metadata_limit_bytes: vars.parsed("VECTOR_METADATA_LIMIT_BYTES", 40_960)?,
            metadata_fallback: vars.parsed("METADATA_FALLBACK", false)?,
            worker_count: vars.parsed("WORKER_COUNT", 3)?,
            run_timeout: Duration::from_secs(vars.parsed("RUN_TIMEOUT_SECS", 6000)?),
        };

        // chunk text is stored as vector metadata and must always fit
        if ingestion.text_byte_budget >= ingestion.vector_metadata_limit_bytes {
            return Err(ConfigError::Invalid {
                key: "TEXT_BYTE_BUDGET",
                value: format!(
                    "{} (must be below VECTOR_METADATA_LIMIT_BYTES={})",
                    ingestion.text_byte_budget, ingestion.vector_metadata_limit_bytes
                ),
            });
        }
        if ingestion.poll_max_attempts == 0 || ingestion.worker_count == 0 {
            return Err(ConfigError::Invalid {
                key: if ingestion.worker_count == 0 {
                    "WORKER_COUNT"
                } else {
                    "POLL_MAX_ATTEMPTS"
                },
                value: "0".to_string(),
            });
        }

        Ok(Self {
            server,
            database,
            segmentation,
            completion,
            vector,
            graph,
            ingestion,
        })
    }

    pub fn ingestion_settings(&self) -> IngestionSettings {
        IngestionSettings {
            poll_policy: RetryPolicy::new(
                self.ingestion.poll_max_attempts,
                self.ingestion.poll_base_delay,
            )
            .with_warmup(self.ingestion.poll_warmup),
            vector_batch_size: self.vector.batch_size,
            graph_policy: self
                .graph
                .as_ref()
                .map(|g| g.failure_policy)
                .unwrap_or_default(),
        }
    }
}

fn graph_policy<F>(vars: &Vars<'_, F>) -> Result<GraphFailurePolicy, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match vars.or("GRAPH_FAILURE_POLICY", "ignore").to_lowercase().as_str() {
        "ignore" => Ok(GraphFailurePolicy::Ignore),
        "propagate" => Ok(GraphFailurePolicy::Propagate),
        "retry" => Ok(GraphFailurePolicy::Retry {
            max_attempts: vars.parsed("GRAPH_RETRY_ATTEMPTS", 3)?,
            base_delay: Duration::from_millis(vars.parsed("GRAPH_RETRY_DELAY_MS", 1000)?),
        }),
        other => Err(ConfigError::Invalid {
            key: "GRAPH_FAILURE_POLICY",
            value: other.to_string(),
        }),
    }
}

struct Vars<'a, F>(&'a F);

impl<F> Vars<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing(key))
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match self.get(key) {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { key, value }),
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/citeweave"),
            ("CHUNKR_API_KEY", "chunkr-key"),
            ("COMPLETION_API_KEY", "sk-test"),
            ("PINECONE_INDEX_HOST", "https://papers-abc.svc.pinecone.io"),
            ("PINECONE_API_KEY", "pc-key"),
            ("NEO4J_HTTP_URL", "http://localhost:7474"),
            ("NEO4J_PASSWORD", "secret"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = load(&base()).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.vector.batch_size, 96);
        assert_eq!(config.completion.reference_model, "gpt-4o");
        assert_eq!(config.ingestion.text_byte_budget, 20_000);
        assert!(!config.ingestion.metadata_fallback);

        let graph = config.graph.as_ref().unwrap();
        assert_eq!(graph.failure_policy, GraphFailurePolicy::Ignore);

        let settings = config.ingestion_settings();
        assert_eq!(settings.poll_policy.max_attempts, 30);
        assert_eq!(settings.poll_policy.warmup, Duration::from_secs(10));
    }

    #[test]
    fn test_missing_secret() {
        let mut vars = base();
        vars.remove("CHUNKR_API_KEY");
        assert_eq!(load(&vars).unwrap_err(), ConfigError::Missing("CHUNKR_API_KEY"));
    }

    #[test]
    fn test_invalid_number() {
        let mut vars = base();
        vars.insert("PORT", "eighty");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { key: "PORT", .. })
        ));
    }

    #[test]
    fn test_budget_must_fit_metadata_limit() {
        let mut vars = base();
        vars.insert("TEXT_BYTE_BUDGET", "50000");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { key: "TEXT_BYTE_BUDGET", .. })
        ));
    }

    #[test]
    fn test_batch_size_is_clamped() {
        let mut vars = base();
        vars.insert("VECTOR_BATCH_SIZE", "500");
        assert_eq!(load(&vars).unwrap().vector.batch_size, 96);
    }

    #[test]
    fn test_graph_disabled_needs_no_credentials() {
        let mut vars = base();
        vars.remove("NEO4J_HTTP_URL");
        vars.remove("NEO4J_PASSWORD");
        vars.insert("GRAPH_ENABLED", "false");

        let config = load(&vars).unwrap();
        assert!(config.graph.is_none());
        assert_eq!(config.ingestion_settings().graph_policy, GraphFailurePolicy::Ignore);
    }

    #[test]
    fn test_retry_policy_and_pgvector() {
        let mut vars = base();
        vars.insert("GRAPH_FAILURE_POLICY", "retry");
        vars.insert("GRAPH_RETRY_ATTEMPTS", "5");
        vars.insert("VECTOR_BACKEND", "pgvector");
        vars.insert("EMBEDDINGS_SERVICE_URL", "http://localhost:8000");

        let config = load(&vars).unwrap();
        assert_eq!(
            config.graph.unwrap().failure_policy,
            GraphFailurePolicy::Retry {
                max_attempts: 5,
                base_delay: Duration::from_millis(1000)
            }
        );
        assert_eq!(
            config.vector.backend,
            VectorBackend::Pgvector {
                embeddings_url: "http://localhost:8000".to_string()
            }
        );
    }
}
