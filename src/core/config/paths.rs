use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub project_root: PathBuf,
    /// Served under `/data`; holds the corpus file and nothing sensitive.
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub secrets_path: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let project_root = discover_project_root();
        let data_dir = env::var("CODECHAT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| project_root.join("data"));
        Self::with_dirs(project_root, data_dir)
    }

    /// Layout rooted at `project_root`, used by tests and the ingester.
    pub fn at(project_root: &Path) -> Self {
        Self::with_dirs(project_root.to_path_buf(), project_root.join("data"))
    }

    fn with_dirs(project_root: PathBuf, data_dir: PathBuf) -> Self {
        let log_dir = project_root.join("logs");
        let secrets_path = project_root.join("secrets.yaml");

        for dir in [&data_dir, &log_dir] {
            let _ = fs::create_dir_all(dir);
        }

        AppPaths {
            project_root,
            data_dir,
            log_dir,
            secrets_path,
        }
    }

    pub fn default_corpus_path(&self) -> PathBuf {
        self.data_dir.join("embeddings.json")
    }

    /// The reference layout keeps the frontend next to the backend.
    pub fn default_source_dir(&self) -> PathBuf {
        self.project_root.join("..").join("frontend").join("src")
    }

    /// Relative paths in config are resolved against the project root.
    pub fn resolve(&self, raw: &Path) -> PathBuf {
        if raw.is_absolute() {
            raw.to_path_buf()
        } else {
            self.project_root.join(raw)
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_project_root() -> PathBuf {
    if let Ok(root) = env::var("CODECHAT_ROOT") {
        return PathBuf::from(root);
    }

    env::current_dir().unwrap_or_else(|_| PathBuf::from(env!("CARGO_MANIFEST_DIR")))
}
