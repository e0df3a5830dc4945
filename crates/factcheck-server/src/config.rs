use anyhow::{Context, Result};
use factcheck_core::Config;
use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub listen_addr: String,
    pub static_dir: PathBuf,
    pub factcheck: Config,
}

impl AppConfig {
    const DEFAULT_LISTEN_ADDR: &'static str = "0.0.0.0:8000";
    const DEFAULT_STATIC_DIR: &'static str = "crates/factcheck-server/static";

    pub fn from_env() -> Result<Self> {
        let listen_addr = env::var("FACTCHECK_LISTEN_ADDR")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| Self::DEFAULT_LISTEN_ADDR.to_string());

        let static_dir = env::var("FACTCHECK_STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(Self::DEFAULT_STATIC_DIR));
        let static_dir = if static_dir.is_relative() {
            env::current_dir()
                .map(|cwd| cwd.join(&static_dir))
                .unwrap_or(static_dir)
        } else {
            static_dir
        };

        let factcheck = Config::from_env().context("invalid fact-check configuration")?;

        Ok(Self {
            listen_addr,
            static_dir,
            factcheck,
        })
    }
}
