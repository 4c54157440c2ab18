use std::path::PathBuf;
use std::sync::Arc;

use aether_core::storage::{load_identity, AuditStore, FileStore, KeyValueStore};
use aether_core::AetherConfig;
use anyhow::{Context, Result};
use clap::Args;

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Data directory [default: <local data dir>/aether]
    #[arg(long, global = true, env = "AETHER_HOME")]
    pub home: Option<PathBuf>,

    /// Base URL of an Ollama-compatible server
    #[arg(long, global = true, env = "AETHER_ENGINE_URL")]
    pub engine_url: Option<String>,

    /// Model to request from the inference server
    #[arg(long, global = true, env = "AETHER_MODEL")]
    pub model: Option<String>,
}

/// The opened home directory: effective config plus its stores.
pub struct Workspace {
    pub home: PathBuf,
    pub config: AetherConfig,
    pub store: Arc<FileStore>,
    pub audit: Arc<AuditStore>,
}

impl Workspace {
    pub fn open(opts: &GlobalOpts) -> Result<Self> {
        let home = match &opts.home {
            Some(home) => home.clone(),
            None => dirs::data_local_dir()
                .context("Could not determine a local data directory; pass --home")?
                .join("aether"),
        };

        let mut config = AetherConfig::load(&home)
            .with_context(|| format!("Failed to load config from {}", home.display()))?;
        if let Some(url) = &opts.engine_url {
            config.engine_url = Some(url.clone());
        }
        if let Some(model) = &opts.model {
            config.model = model.clone();
        }
        config.validate().context("Invalid configuration")?;

        let store = Arc::new(
            FileStore::open(&home)
                .with_context(|| format!("Failed to open store at {}", home.display()))?,
        );
        let audit = Arc::new(
            AuditStore::new(store.clone() as Arc<dyn KeyValueStore>)
                .with_capacity(config.log_capacity),
        );
        tracing::debug!(home = %home.display(), "Workspace opened");

        Ok(Self {
            home,
            config,
            store,
            audit,
        })
    }

    /// Explicit user if given, else the signed-in identity.
    pub fn resolve_user(&self, explicit: Option<&str>) -> Result<Option<String>> {
        if let Some(user) = explicit.map(str::trim).filter(|u| !u.is_empty()) {
            return Ok(Some(user.to_string()));
        }
        let identity = load_identity(self.store.as_ref()).context("Failed to read identity")?;
        Ok(identity.map(|i| i.email))
    }
}
