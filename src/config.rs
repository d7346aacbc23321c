//! Configuration Module
//!
//! Per-cache policy settings, sweep tuning knobs, and registry-wide
//! configuration with environment-variable resolution.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

// == Defaults ==
/// Write expiry applied when a cache has no expiry configured anywhere
pub const DEFAULT_WRITE_EXPIRY: Duration = Duration::from_secs(30 * 60);

/// Entry bound applied when a cache has no bound configured anywhere
pub const DEFAULT_MAX_ENTRIES: u64 = 1000;

// == Cache Config ==
/// Immutable policy triple for one named cache.
///
/// Resolved once when the cache is created and never mutated afterward.
/// `None` means the corresponding policy is disabled: no access expiry,
/// no write expiry, or an unbounded entry count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheConfig {
    /// Expire entries this long after their last read or write
    pub access_expiry: Option<Duration>,
    /// Expire entries this long after their last write
    pub write_expiry: Option<Duration>,
    /// Soft upper bound on entry count, enforced by sweeps
    pub max_entries: Option<u64>,
}

impl CacheConfig {
    /// Creates a config with every policy disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the access expiry window.
    pub fn with_access_expiry(mut self, window: Duration) -> Self {
        self.access_expiry = Some(window);
        self
    }

    /// Sets the write expiry window.
    pub fn with_write_expiry(mut self, window: Duration) -> Self {
        self.write_expiry = Some(window);
        self
    }

    /// Sets the soft maximum entry count.
    pub fn with_max_entries(mut self, max: u64) -> Self {
        self.max_entries = Some(max);
        self
    }

    // == Effective Expiry ==
    /// Returns the window used for the lazy expiry check, or None when
    /// neither expiry is configured.
    ///
    /// Access expiry takes precedence when both are set: the timestamp
    /// record holds a single instant, refreshed by reads under access
    /// expiry, so the access window is the one the record can honestly
    /// answer for.
    pub fn expiry_window(&self) -> Option<Duration> {
        self.access_expiry.or(self.write_expiry)
    }
}

// == Sweep Tuning ==
/// Throttle parameters for the sweep coordinator.
///
/// The defaults correspond to the empirically tuned constants of the
/// throttled sweep design: overshoot bursts under 250 entries are corrected
/// inline, larger bursts move to a background task at most once per 500ms,
/// and the sweep guard is leased for 250ms at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepTuning {
    /// Overshoot below this count is swept inline on the writing caller
    pub burst_threshold: u64,
    /// Minimum delay between background sweep submissions
    pub sweep_backoff: Duration,
    /// Lease duration for the named sweep guard
    pub guard_lease: Duration,
}

impl Default for SweepTuning {
    fn default() -> Self {
        Self {
            burst_threshold: 250,
            sweep_backoff: Duration::from_millis(500),
            guard_lease: Duration::from_millis(250),
        }
    }
}

impl SweepTuning {
    /// Creates a SweepTuning by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SWEEP_BURST_THRESHOLD` - Inline sweep overshoot limit (default: 250)
    /// - `SWEEP_BACKOFF_MS` - Background submission throttle (default: 500)
    /// - `GUARD_LEASE_MS` - Sweep guard lease duration (default: 250)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            burst_threshold: env::var("SWEEP_BURST_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.burst_threshold),
            sweep_backoff: env::var("SWEEP_BACKOFF_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.sweep_backoff),
            guard_lease: env::var("GUARD_LEASE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.guard_lease),
        }
    }
}

// == Registry Config ==
/// Process-wide cache configuration handed to the registry at construction.
///
/// Per-cache settings resolve in three steps: an explicit override
/// registered with [`with_cache`](Self::with_cache) wins outright;
/// otherwise each field is read from the cache's environment variables;
/// otherwise the registry-wide default applies.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Default access expiry for caches without their own setting
    pub access_expiry: Option<Duration>,
    /// Default write expiry for caches without their own setting
    pub write_expiry: Option<Duration>,
    /// Default entry bound for caches without their own setting
    pub max_entries: Option<u64>,
    /// Sweep throttle parameters shared by every cache
    pub tuning: SweepTuning,
    /// Explicit per-cache configs, consulted before the environment
    overrides: HashMap<String, CacheConfig>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            access_expiry: None,
            write_expiry: Some(DEFAULT_WRITE_EXPIRY),
            max_entries: Some(DEFAULT_MAX_ENTRIES),
            tuning: SweepTuning::default(),
            overrides: HashMap::new(),
        }
    }
}

impl RegistryConfig {
    /// Creates a RegistryConfig by loading defaults from environment
    /// variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DEFAULT_ACCESS_EXPIRY_MS` - Default access expiry (default: disabled)
    /// - `CACHE_DEFAULT_WRITE_EXPIRY_MS` - Default write expiry (default: 1800000)
    /// - `CACHE_DEFAULT_MAX_ENTRIES` - Default entry bound (default: 1000)
    ///
    /// Negative values disable the corresponding default. Sweep tuning is
    /// loaded via [`SweepTuning::from_env`].
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            access_expiry: duration_setting(
                env_i64("CACHE_DEFAULT_ACCESS_EXPIRY_MS"),
                defaults.access_expiry,
            ),
            write_expiry: duration_setting(
                env_i64("CACHE_DEFAULT_WRITE_EXPIRY_MS"),
                defaults.write_expiry,
            ),
            max_entries: count_setting(
                env_i64("CACHE_DEFAULT_MAX_ENTRIES"),
                defaults.max_entries,
            ),
            tuning: SweepTuning::from_env(),
            overrides: HashMap::new(),
        }
    }

    /// Registers an explicit config for one cache name, bypassing both the
    /// environment and the registry defaults for that cache.
    pub fn with_cache(mut self, name: impl Into<String>, config: CacheConfig) -> Self {
        self.overrides.insert(name.into(), config);
        self
    }

    /// Replaces the sweep tuning parameters.
    pub fn with_tuning(mut self, tuning: SweepTuning) -> Self {
        self.tuning = tuning;
        self
    }

    // == Per-Name Resolution ==
    /// Resolves the policy triple for a named cache.
    ///
    /// # Environment Variables (per cache, name uppercased)
    /// - `CACHE_<NAME>_ACCESS_EXPIRY_MS`
    /// - `CACHE_<NAME>_WRITE_EXPIRY_MS`
    /// - `CACHE_<NAME>_MAX_ENTRIES`
    ///
    /// A negative value disables that setting for the cache even when a
    /// registry default exists.
    pub fn resolve(&self, name: &str) -> CacheConfig {
        if let Some(config) = self.overrides.get(name) {
            return config.clone();
        }
        CacheConfig {
            access_expiry: duration_setting(
                env_i64(&cache_env_key(name, "ACCESS_EXPIRY_MS")),
                self.access_expiry,
            ),
            write_expiry: duration_setting(
                env_i64(&cache_env_key(name, "WRITE_EXPIRY_MS")),
                self.write_expiry,
            ),
            max_entries: count_setting(
                env_i64(&cache_env_key(name, "MAX_ENTRIES")),
                self.max_entries,
            ),
        }
    }
}

// == Env Helpers ==
/// Builds the environment variable key for a cache-scoped setting.
///
/// Cache names are uppercased and any character outside [A-Za-z0-9]
/// becomes an underscore, so the cache "user-sessions" reads from
/// `CACHE_USER_SESSIONS_*`.
fn cache_env_key(name: &str, suffix: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("CACHE_{}_{}", sanitized, suffix)
}

fn env_i64(key: &str) -> Option<i64> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Interprets a raw millisecond setting: absent falls back to the default,
/// negative disables, anything else is a window in milliseconds.
fn duration_setting(raw: Option<i64>, default: Option<Duration>) -> Option<Duration> {
    match raw {
        Some(ms) if ms >= 0 => Some(Duration::from_millis(ms as u64)),
        Some(_) => None,
        None => default,
    }
}

fn count_setting(raw: Option<i64>, default: Option<u64>) -> Option<u64> {
    match raw {
        Some(count) if count >= 0 => Some(count as u64),
        Some(_) => None,
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_default_disables_everything() {
        let config = CacheConfig::default();
        assert!(config.access_expiry.is_none());
        assert!(config.write_expiry.is_none());
        assert!(config.max_entries.is_none());
        assert!(config.expiry_window().is_none());
    }

    #[test]
    fn test_expiry_window_prefers_access() {
        let config = CacheConfig::new()
            .with_access_expiry(Duration::from_millis(200))
            .with_write_expiry(Duration::from_secs(60));
        assert_eq!(config.expiry_window(), Some(Duration::from_millis(200)));
    }

    #[test]
    fn test_expiry_window_falls_back_to_write() {
        let config = CacheConfig::new().with_write_expiry(Duration::from_secs(60));
        assert_eq!(config.expiry_window(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_sweep_tuning_defaults() {
        let tuning = SweepTuning::default();
        assert_eq!(tuning.burst_threshold, 250);
        assert_eq!(tuning.sweep_backoff, Duration::from_millis(500));
        assert_eq!(tuning.guard_lease, Duration::from_millis(250));
    }

    #[test]
    fn test_registry_config_defaults() {
        let config = RegistryConfig::default();
        assert!(config.access_expiry.is_none());
        assert_eq!(config.write_expiry, Some(DEFAULT_WRITE_EXPIRY));
        assert_eq!(config.max_entries, Some(DEFAULT_MAX_ENTRIES));
    }

    #[test]
    fn test_registry_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_DEFAULT_ACCESS_EXPIRY_MS");
        env::remove_var("CACHE_DEFAULT_WRITE_EXPIRY_MS");
        env::remove_var("CACHE_DEFAULT_MAX_ENTRIES");
        env::remove_var("SWEEP_BURST_THRESHOLD");
        env::remove_var("SWEEP_BACKOFF_MS");
        env::remove_var("GUARD_LEASE_MS");

        let config = RegistryConfig::from_env();
        assert!(config.access_expiry.is_none());
        assert_eq!(config.write_expiry, Some(DEFAULT_WRITE_EXPIRY));
        assert_eq!(config.max_entries, Some(DEFAULT_MAX_ENTRIES));
        assert_eq!(config.tuning, SweepTuning::default());
    }

    #[test]
    fn test_resolve_uses_registry_defaults() {
        let config = RegistryConfig::default();
        let resolved = config.resolve("resolve_defaults_cache");
        assert_eq!(resolved.write_expiry, Some(DEFAULT_WRITE_EXPIRY));
        assert_eq!(resolved.max_entries, Some(DEFAULT_MAX_ENTRIES));
        assert!(resolved.access_expiry.is_none());
    }

    #[test]
    fn test_resolve_prefers_explicit_override() {
        let explicit = CacheConfig::new().with_max_entries(5);
        let config = RegistryConfig::default().with_cache("orders", explicit.clone());

        let resolved = config.resolve("orders");
        assert_eq!(resolved, explicit);
        // Override is total: no registry default leaks in.
        assert!(resolved.write_expiry.is_none());
    }

    #[test]
    fn test_resolve_reads_per_cache_env() {
        env::set_var("CACHE_ENV_RESOLVED_CACHE_MAX_ENTRIES", "7");
        env::set_var("CACHE_ENV_RESOLVED_CACHE_ACCESS_EXPIRY_MS", "250");

        let config = RegistryConfig::default();
        let resolved = config.resolve("env-resolved-cache");
        assert_eq!(resolved.max_entries, Some(7));
        assert_eq!(resolved.access_expiry, Some(Duration::from_millis(250)));
        // Unset field still falls back to the registry default.
        assert_eq!(resolved.write_expiry, Some(DEFAULT_WRITE_EXPIRY));

        env::remove_var("CACHE_ENV_RESOLVED_CACHE_MAX_ENTRIES");
        env::remove_var("CACHE_ENV_RESOLVED_CACHE_ACCESS_EXPIRY_MS");
    }

    #[test]
    fn test_negative_env_value_disables_setting() {
        env::set_var("CACHE_UNBOUNDED_CACHE_MAX_ENTRIES", "-1");
        env::set_var("CACHE_UNBOUNDED_CACHE_WRITE_EXPIRY_MS", "-1");

        let config = RegistryConfig::default();
        let resolved = config.resolve("unbounded_cache");
        assert!(resolved.max_entries.is_none());
        assert!(resolved.write_expiry.is_none());

        env::remove_var("CACHE_UNBOUNDED_CACHE_MAX_ENTRIES");
        env::remove_var("CACHE_UNBOUNDED_CACHE_WRITE_EXPIRY_MS");
    }

    #[test]
    fn test_cache_env_key_sanitizes_name() {
        assert_eq!(
            cache_env_key("user-sessions", "MAX_ENTRIES"),
            "CACHE_USER_SESSIONS_MAX_ENTRIES"
        );
        assert_eq!(
            cache_env_key("posts.byTag", "WRITE_EXPIRY_MS"),
            "CACHE_POSTS_BYTAG_WRITE_EXPIRY_MS"
        );
    }
}
