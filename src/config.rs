use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub storage: StorageConfig,

    pub remote: RemoteConfig,

    pub security: SecurityConfig,

    pub scheduler: SchedulerConfig,

    pub ux: UxConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Event bus buffer size (default: 100)
    pub event_bus_buffer_size: usize,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/betadesk.db".to_string(),
            log_level: "info".to_string(),
            event_bus_buffer_size: 100,
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on session cookies.
    /// Set to false for local development without HTTPS.
    pub secure_cookies: bool,

    /// Sessions expire after this many minutes without a request.
    pub session_inactivity_minutes: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 6790,
            cors_allowed_origins: vec![
                "http://localhost:6790".to_string(),
                "http://127.0.0.1:6790".to_string(),
            ],
            secure_cookies: true,
            session_inactivity_minutes: 60,
        }
    }
}

/// Which copy wins when both the remote and the local cache hold a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadPolicy {
    /// Remote is the source of truth; the local store is an offline cache.
    #[default]
    RemoteFirst,
    /// Never read from the remote; it only receives replicated writes.
    LocalOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Store local blobs with the reversible text encoding instead of raw JSON.
    /// This hides nothing from anyone with access to the database file.
    pub obfuscate_local: bool,

    pub read_policy: ReadPolicy,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            obfuscate_local: true,
            read_policy: ReadPolicy::RemoteFirst,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteKind {
    /// Realtime-database style REST endpoint (`{url}/{path}.json`).
    #[default]
    Firebase,
    /// Process-local store, used for tests and single-node replicas.
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub enabled: bool,

    pub kind: RemoteKind,

    pub url: String,

    /// Appended as `?auth=` to every request when set.
    pub auth_token: Option<String>,

    pub request_timeout_seconds: u64,

    /// How often watched paths are polled for changes.
    pub poll_interval_seconds: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            kind: RemoteKind::Firebase,
            url: String::new(),
            auth_token: None,
            request_timeout_seconds: 10,
            poll_interval_seconds: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordScheme {
    #[default]
    Argon2,
    /// Rolling checksum kept for compatibility with data written by older
    /// clients. Not a cryptographic hash.
    Legacy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Scheme used for newly stored passwords.
    pub password_scheme: PasswordScheme,

    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// Re-hash legacy checksums with the configured scheme on successful login.
    pub auto_migrate_legacy_hashes: bool,

    /// Persist a plaintext copy next to the hash so admins can reveal it later.
    /// When false, plaintext is only available during the temporary reveal window.
    pub retain_plaintext_passwords: bool,

    /// Lifetime of a temporary password reveal.
    pub temp_password_ttl_minutes: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            password_scheme: PasswordScheme::Argon2,
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            auto_migrate_legacy_hashes: true,
            retain_plaintext_passwords: false,
            temp_password_ttl_minutes: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,

    pub temp_password_purge_minutes: u32,

    /// Pull every collection from the remote into the local cache.
    /// 0 disables the job.
    pub remote_resync_minutes: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            temp_password_purge_minutes: 5,
            remote_resync_minutes: 0,
        }
    }
}

/// Artificial latency before user actions. Both 0 disables it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UxConfig {
    pub min_delay_ms: u64,

    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("betadesk").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".betadesk").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.remote.enabled
            && self.remote.kind == RemoteKind::Firebase
            && self.remote.url.trim().is_empty()
        {
            anyhow::bail!("Remote URL cannot be empty when the firebase remote is enabled");
        }

        if self.ux.min_delay_ms > self.ux.max_delay_ms {
            anyhow::bail!("ux.min_delay_ms cannot be greater than ux.max_delay_ms");
        }

        if self.security.temp_password_ttl_minutes == 0 {
            anyhow::bail!("security.temp_password_ttl_minutes must be > 0");
        }

        if self.server.enabled && self.server.port == 0 {
            anyhow::bail!("server.port must be > 0");
        }

        if self.remote.poll_interval_seconds == 0 {
            anyhow::bail!("remote.poll_interval_seconds must be > 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 6790);
        assert!(config.storage.obfuscate_local);
        assert_eq!(config.storage.read_policy, ReadPolicy::RemoteFirst);
        assert_eq!(config.security.password_scheme, PasswordScheme::Argon2);
        assert_eq!(config.security.temp_password_ttl_minutes, 30);
        assert!(!config.remote.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[storage]"));
        assert!(toml_str.contains("[security]"));
        assert!(toml_str.contains("read_policy = \"remote_first\""));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [remote]
            enabled = true
            kind = "memory"

            [security]
            password_scheme = "legacy"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.remote.kind, RemoteKind::Memory);
        assert_eq!(config.security.password_scheme, PasswordScheme::Legacy);
        assert_eq!(config.server.port, 6790);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_firebase_without_url() {
        let mut config = Config::default();
        config.remote.enabled = true;
        assert!(config.validate().is_err());

        config.remote.url = "https://beta.example.firebaseio.com".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_delay() {
        let mut config = Config::default();
        config.ux.min_delay_ms = 3000;
        config.ux.max_delay_ms = 1000;
        assert!(config.validate().is_err());
    }
}
