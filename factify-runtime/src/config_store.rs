use anyhow::Context;
use factify_core::config::ClientConfig;
use factify_providers::endpoints::validate_base_url;
use std::path::{Path, PathBuf};

pub const ENV_API_URL: &str = "FACTIFY_API_URL";

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is a fresh install, not an error.
    pub fn load(&self) -> anyhow::Result<ClientConfig> {
        if !self.path.exists() {
            log::debug!("no config at {}, using defaults", self.path.display());
            return Ok(ClientConfig::default());
        }
        let bytes = std::fs::read(&self.path)
            .with_context(|| format!("read config: {}", self.path.display()))?;
        let cfg: ClientConfig = serde_json::from_slice(&bytes).context("decode config JSON")?;
        Ok(cfg)
    }

    /// Stored config plus environment overrides. This is what clients run with.
    pub fn load_effective(&self) -> anyhow::Result<ClientConfig> {
        let cfg = self.load()?;
        Ok(apply_overrides(cfg, |k| std::env::var(k).ok()))
    }

    pub fn save(&self, cfg: &ClientConfig) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(cfg).context("encode config JSON")?;
        crate::fs::write_replacing(&self.path, &json)
            .with_context(|| format!("save config: {}", self.path.display()))
    }

    /// Updates one field by its JSON name and persists the result.
    pub fn set(&self, key: &str, value: &str) -> anyhow::Result<ClientConfig> {
        let mut cfg = self.load()?;
        set_field(&mut cfg, key, value)?;
        self.save(&cfg)?;
        Ok(cfg)
    }
}

pub fn apply_overrides(
    mut cfg: ClientConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> ClientConfig {
    if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
        cfg.base_url = url.trim().to_string();
    }
    cfg
}

pub fn set_field(cfg: &mut ClientConfig, key: &str, value: &str) -> anyhow::Result<()> {
    let value = value.trim();
    match key {
        "base_url" => cfg.base_url = validate_base_url(value)?,
        "poll_interval_ms" => cfg.poll_interval_ms = parse_num(key, value)?,
        "max_attempts" => {
            let n: u32 = parse_num(key, value)?;
            anyhow::ensure!(n > 0, "max_attempts must be at least 1");
            cfg.max_attempts = n;
        }
        "connect_timeout_secs" => cfg.connect_timeout_secs = parse_num(key, value)?,
        "request_timeout_secs" => cfg.request_timeout_secs = parse_num(key, value)?,
        "history_enabled" => {
            cfg.history_enabled = value
                .parse()
                .with_context(|| format!("{key} expects true or false, got {value:?}"))?
        }
        "history_max_entries" => cfg.history_max_entries = parse_num(key, value)?,
        other => anyhow::bail!("unknown config key: {other}"),
    }
    Ok(())
}

fn parse_num<T: std::str::FromStr>(key: &str, value: &str) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .with_context(|| format!("{key} expects a number, got {value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at_path(dir.path().join("config.json"));
        assert_eq!(store.load().unwrap(), ClientConfig::default());
    }

    #[test]
    fn round_trips_config() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at_path(dir.path().join("factify").join("config.json"));

        let cfg = ClientConfig {
            poll_interval_ms: 500,
            history_enabled: false,
            ..ClientConfig::default().with_base_url("https://factify.example/api")
        };
        store.save(&cfg).unwrap();

        assert_eq!(store.load().unwrap(), cfg);
    }

    #[test]
    fn set_validates_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at_path(dir.path().join("config.json"));

        store.set("base_url", "https://factify.example/api/").unwrap();
        store.set("max_attempts", "10").unwrap();

        let cfg = store.load().unwrap();
        assert_eq!(cfg.base_url, "https://factify.example/api");
        assert_eq!(cfg.max_attempts, 10);

        assert!(store.set("max_attempts", "0").is_err());
        assert!(store.set("base_url", "ftp://nope").is_err());
        assert!(store.set("colour", "blue").is_err());
        assert_eq!(store.load().unwrap().max_attempts, 10);
    }

    #[test]
    fn env_url_overrides_stored_value() {
        let cfg = apply_overrides(ClientConfig::default(), |k| {
            (k == ENV_API_URL).then(|| " https://env.example/api ".to_string())
        });
        assert_eq!(cfg.base_url, "https://env.example/api");

        let untouched = apply_overrides(ClientConfig::default(), |_| Some(String::new()));
        assert_eq!(untouched.base_url, ClientConfig::default().base_url);
    }
}
