pub mod paths;
pub mod service;
pub mod types;
pub mod validation;

pub use paths::AppPaths;
pub use service::{ConfigError, ConfigService};
pub use types::{AppConfig, CorpusConfig, IngestConfig, ProviderConfig, QueryConfig, ServerConfig};
