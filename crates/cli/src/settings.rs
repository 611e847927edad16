//! Configuration loading and logging setup

use anyhow::{Context, Result};
use directories::ProjectDirs;
use qrmaster_infra_sqlite::StoreConfig;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CONFIG_FILE: &str = "qrmaster.toml";
const ENV_PREFIX: &str = "QRMASTER";

/// Install the global subscriber. `QRMASTER_LOG_FORMAT=json` selects JSON lines.
pub fn init_logging() -> Result<()> {
    let log_format = std::env::var("QRMASTER_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("qrmaster=info"))
        .context("Failed to create env filter")?;

    // Logs go to stderr so command output stays pipeable
    match log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    }
    .context("Failed to install tracing subscriber")
}

/// Layered configuration: built-in defaults, then `qrmaster.toml` in the
/// platform config dir, then `explicit`, then `QRMASTER_*` variables
pub fn load_config(explicit: Option<&Path>) -> Result<StoreConfig> {
    let dirs = ProjectDirs::from("app", "QRMaster", "qrmaster");
    load_config_from(dirs.as_ref(), explicit)
}

fn load_config_from(dirs: Option<&ProjectDirs>, explicit: Option<&Path>) -> Result<StoreConfig> {
    let (data_dir, config_file) = match dirs {
        Some(dirs) => (
            dirs.data_dir().to_path_buf(),
            Some(dirs.config_dir().join(CONFIG_FILE)),
        ),
        None => (PathBuf::from("."), None),
    };

    let mut builder = config::Config::builder()
        .set_default("data_dir", data_dir.to_string_lossy().into_owned())?
        .set_default(
            "durable_store_dir",
            data_dir.join("durable").to_string_lossy().into_owned(),
        )?;

    if let Some(path) = config_file {
        builder = builder.add_source(config::File::from(path).required(false));
    }
    if let Some(path) = explicit {
        builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
    }
    builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));

    let mut store: StoreConfig = builder
        .build()
        .context("Failed to read configuration")?
        .try_deserialize()
        .context("Invalid configuration")?;

    store.data_dir = expand(&store.data_dir);
    store.durable_store_dir = expand(&store.durable_store_dir);
    store.legacy_dir = store.legacy_dir.as_deref().map(expand);
    store.validate()?;

    Ok(store)
}

/// `~` and `$VAR` expansion; paths that fail to expand are kept as given
fn expand(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => path.to_path_buf(),
    }
}
