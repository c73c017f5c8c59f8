mod service;

pub use service::{QueryOptions, QueryService, FALLBACK_ANSWER};
