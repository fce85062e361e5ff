use core::str::FromStr;
use core::time::Duration;
use std::env::var;
use std::fs::{read_to_string, write};

use camino::{Utf8Path, Utf8PathBuf};
use eyre::{Result as EyreResult, WrapErr};
use orkl_primitives::EntryId;
use serde::{Deserialize, Serialize};
use url::Url;

pub const CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_BASE_URL: &str = "https://orkl.eu/api/v1";
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// On-disk configuration of the connector, one `config.toml` per home
/// directory. Environment variables override file values after load, see
/// [`ConfigFile::apply_env_overrides`].
#[derive(Debug, Deserialize, Serialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub connector: ConnectorConfig,

    #[serde(default)]
    pub orkl: OrklConfig,

    pub platform: PlatformConfig,

    #[serde(default)]
    pub state: StateConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ConnectorConfig {
    /// Display name used for work descriptions on the platform.
    #[serde(default = "default_connector_name")]
    pub name: String,

    /// Perform a single pass and exit instead of looping.
    #[serde(default)]
    pub run_and_terminate: bool,

    /// Ask the platform to update objects that already exist.
    #[serde(default = "default_true")]
    pub update_existing_data: bool,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            name: default_connector_name(),
            run_and_terminate: false,
            update_existing_data: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct OrklConfig {
    #[serde(default = "default_base_url")]
    pub base_url: Url,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Pause between synchronization runs.
    #[serde(rename = "interval_hours", with = "serde_hours", default = "default_interval")]
    pub interval: Duration,

    /// Per-run processing budget; entries beyond it are deferred to the
    /// next run.
    #[serde(default = "default_max_entries")]
    pub max_entries_to_process: u32,

    /// First calendar year pulled when no checkpoint exists yet.
    #[serde(default = "default_start_year")]
    pub history_start_year: i32,

    /// Operator override of the stored checkpoint.
    #[serde(default)]
    pub sync_from_version: Option<EntryId>,

    /// Re-sync on every interval. When disabled the connector performs one
    /// effective sync and then idles.
    #[serde(default = "default_true")]
    pub maintain_data: bool,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Courtesy delay after every request to the library API.
    #[serde(
        rename = "request_delay_ms",
        with = "serde_millis",
        default = "default_request_delay"
    )]
    pub request_delay: Duration,

    /// Extra settle delay before the interval sleep.
    #[serde(rename = "cooldown_secs", with = "serde_secs", default)]
    pub cooldown: Duration,
}

impl Default for OrklConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            interval: default_interval(),
            max_entries_to_process: default_max_entries(),
            history_start_year: default_start_year(),
            sync_from_version: None,
            maintain_data: true,
            page_size: default_page_size(),
            request_delay: default_request_delay(),
            cooldown: Duration::ZERO,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PlatformConfig {
    pub url: Url,

    #[serde(default)]
    pub token: Option<String>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            url: default_platform_url(),
            token: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct StateConfig {
    /// Checkpoint document location, relative to the connector home.
    #[serde(default = "default_state_path")]
    pub path: Utf8PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

fn default_state_path() -> Utf8PathBuf {
    Utf8PathBuf::from("checkpoint.json")
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            connector: ConnectorConfig::default(),
            orkl: OrklConfig::default(),
            platform: PlatformConfig::default(),
            state: StateConfig::default(),
        }
    }
}

impl ConfigFile {
    #[must_use]
    pub fn exists(dir: &Utf8Path) -> bool {
        dir.join(CONFIG_FILE).is_file()
    }

    pub fn load(dir: &Utf8Path) -> EyreResult<Self> {
        let path = dir.join(CONFIG_FILE);
        let content = read_to_string(&path)
            .wrap_err_with(|| format!("failed to read configuration from {path:?}"))?;

        toml::from_str(&content).map_err(Into::into)
    }

    pub fn save(&self, dir: &Utf8Path) -> EyreResult<()> {
        let path = dir.join(CONFIG_FILE);
        let content = toml::to_string_pretty(self)?;

        write(&path, content)
            .wrap_err_with(|| format!("failed to write configuration to {path:?}"))?;

        Ok(())
    }

    /// Applies `ORKL_*` / `CONNECTOR_*` / `PLATFORM_*` environment overrides
    /// on top of the loaded file. Environment wins over file.
    pub fn apply_env_overrides(&mut self) -> EyreResult<()> {
        self.apply_overrides(&|key| var(key).ok())
    }

    pub fn apply_overrides(&mut self, lookup: &dyn Fn(&str) -> Option<String>) -> EyreResult<()> {
        if let Some(name) = lookup("CONNECTOR_NAME") {
            self.connector.name = name;
        }
        set_parsed(
            lookup,
            "CONNECTOR_RUN_AND_TERMINATE",
            &mut self.connector.run_and_terminate,
        )?;
        set_parsed(
            lookup,
            "CONNECTOR_UPDATE_EXISTING_DATA",
            &mut self.connector.update_existing_data,
        )?;

        set_parsed(lookup, "ORKL_BASE_URL", &mut self.orkl.base_url)?;
        if let Some(key) = lookup("ORKL_API_KEY") {
            self.orkl.api_key = Some(key);
        }
        if let Some(raw) = lookup("ORKL_INTERVAL") {
            let hours: u64 = raw
                .trim()
                .parse()
                .wrap_err("invalid value in ORKL_INTERVAL")?;
            self.orkl.interval = Duration::from_secs(hours * 60 * 60);
        }
        set_parsed(
            lookup,
            "ORKL_MAX_ENTRIES_TO_PROCESS",
            &mut self.orkl.max_entries_to_process,
        )?;
        set_parsed(
            lookup,
            "ORKL_HISTORY_START_YEAR",
            &mut self.orkl.history_start_year,
        )?;
        set_parsed_opt(
            lookup,
            "ORKL_SYNC_FROM_VERSION",
            &mut self.orkl.sync_from_version,
        )?;
        set_parsed(lookup, "ORKL_MAINTAIN_DATA", &mut self.orkl.maintain_data)?;

        set_parsed(lookup, "PLATFORM_URL", &mut self.platform.url)?;
        if let Some(token) = lookup("PLATFORM_TOKEN") {
            self.platform.token = Some(token);
        }

        Ok(())
    }
}

fn set_parsed<T>(
    lookup: &dyn Fn(&str) -> Option<String>,
    key: &str,
    slot: &mut T,
) -> EyreResult<()>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Some(raw) = lookup(key) {
        *slot = raw
            .trim()
            .parse()
            .wrap_err_with(|| format!("invalid value in {key}"))?;
    }

    Ok(())
}

fn set_parsed_opt<T>(
    lookup: &dyn Fn(&str) -> Option<String>,
    key: &str,
    slot: &mut Option<T>,
) -> EyreResult<()>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Some(raw) = lookup(key) {
        *slot = Some(
            raw.trim()
                .parse()
                .wrap_err_with(|| format!("invalid value in {key}"))?,
        );
    }

    Ok(())
}

fn default_connector_name() -> String {
    "ORKL".to_owned()
}

fn default_base_url() -> Url {
    DEFAULT_BASE_URL.parse().expect("default base URL is valid")
}

fn default_platform_url() -> Url {
    "http://localhost:8080"
        .parse()
        .expect("default platform URL is valid")
}

const fn default_interval() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

const fn default_max_entries() -> u32 {
    20
}

const fn default_start_year() -> i32 {
    2023
}

const fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

const fn default_request_delay() -> Duration {
    Duration::from_secs(6)
}

const fn default_true() -> bool {
    true
}

mod serde_hours {
    use core::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(value.as_secs() / (60 * 60))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hours = u64::deserialize(deserializer)?;

        Ok(Duration::from_secs(hours * 60 * 60))
    }
}

mod serde_millis {
    use core::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod serde_secs {
    use core::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
