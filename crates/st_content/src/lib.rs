use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use st_core::{ContentClient, Error, Result};
use tracing::info;

pub mod backends;

pub use backends::*;

pub const DEFAULT_PAGE_SIZE: u32 = st_core::config::DEFAULT_PAGE_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    Prismic,
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "prismic" => Ok(Self::Prismic),
            other => Err(Error::Config(format!(
                "Unknown content backend: {} (expected memory or prismic)",
                other
            ))),
        }
    }
}

/// Everything needed to build a content backend.
#[derive(Clone)]
pub struct BackendOptions {
    pub endpoint: Option<String>,
    pub access_token: Option<String>,
    pub fixtures: Option<PathBuf>,
    pub timeout: Duration,
}

impl fmt::Debug for BackendOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendOptions")
            .field("endpoint", &self.endpoint)
            .field("access_token", &self.access_token.as_deref().map(|_| "<redacted>"))
            .field("fixtures", &self.fixtures)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            endpoint: None,
            access_token: None,
            fixtures: None,
            timeout: Duration::from_secs(10),
        }
    }
}

pub async fn create_client(kind: BackendKind, options: &BackendOptions) -> Result<Arc<dyn ContentClient>> {
    let client: Arc<dyn ContentClient> = match kind {
        BackendKind::Memory => {
            let client = match &options.fixtures {
                Some(path) => MemoryContentClient::from_file(path).await?,
                None => MemoryContentClient::new(),
            };
            info!("🗃️ Memory content backend ready ({} documents)", client.len().await);
            Arc::new(client)
        }
        BackendKind::Prismic => {
            let endpoint = options
                .endpoint
                .as_deref()
                .ok_or_else(|| Error::Config("The prismic backend needs an endpoint".to_string()))?;
            let config = PrismicConfig::new(endpoint)?
                .with_access_token(options.access_token.clone())
                .with_timeout(options.timeout);
            info!("🌐 Prismic content backend ready ({})", config.endpoint);
            Arc::new(PrismicClient::new(config)?)
        }
    };
    Ok(client)
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_client, BackendKind, BackendOptions};
    pub use st_core::{ContentClient, Document, Error, Result};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_from_str() {
        assert_eq!("memory".parse::<BackendKind>().unwrap(), BackendKind::Memory);
        assert_eq!("Prismic".parse::<BackendKind>().unwrap(), BackendKind::Prismic);
        assert!("qdrant".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_backend_options_debug_redacts_token() {
        let options = BackendOptions {
            access_token: Some("SUPERSECRET".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", options);
        assert!(!debug.contains("SUPERSECRET"));
        assert!(debug.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_prismic_requires_endpoint() {
        let result = create_client(BackendKind::Prismic, &BackendOptions::default()).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_memory_backend_from_fixture_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.json");
        std::fs::write(&path, r#"[{ "id": "1", "uid": "a", "type": "post", "data": { "title": "A" } }]"#).unwrap();

        let options = BackendOptions {
            fixtures: Some(path),
            ..Default::default()
        };
        let client = create_client(BackendKind::Memory, &options).await.unwrap();
        assert_eq!(client.name(), "memory");
        assert!(client.get_by_uid("post", "a", None).await.unwrap().is_some());
    }
}
