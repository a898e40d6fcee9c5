//! Where workflows and application data live

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub const WORKFLOWS_DIR_ENV: &str = "HUMANCRON_WORKFLOWS_DIR";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub workflows_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl Config {
    /// Resolve from the CLI flag, then the environment (after `.env`), then defaults
    pub fn resolve(cli_dir: Option<PathBuf>) -> Result<Self> {
        dotenv::dotenv().ok();

        let home = dirs::home_dir().context("Could not determine home directory")?;
        let env_dir = std::env::var_os(WORKFLOWS_DIR_ENV).map(PathBuf::from);
        let data_dir = ProjectDirs::from("com", "humancron", "humancron")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| home.join(".humancron"));

        Ok(Self::from_sources(cli_dir, env_dir, &home, data_dir))
    }

    fn from_sources(
        cli_dir: Option<PathBuf>,
        env_dir: Option<PathBuf>,
        home: &Path,
        data_dir: PathBuf,
    ) -> Self {
        let workflows_dir = cli_dir
            .or(env_dir.filter(|p| !p.as_os_str().is_empty()))
            .map(|p| expand_tilde(&p, home))
            .unwrap_or_else(|| home.join(".humancron").join("workflows"));

        Self {
            workflows_dir,
            data_dir,
        }
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join("history.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("humancron.log")
    }
}

fn expand_tilde(path: &Path, home: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}
