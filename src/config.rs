use std::fmt;
use std::path::PathBuf;

pub const APP_DIR_NAME: &str = "taskpad";
pub const DATA_DIR_ENV: &str = "TASKPAD_DATA_DIR";
pub const LOG_ENV: &str = "TASKPAD_LOG";

#[derive(Debug)]
pub enum ConfigError {
    NoDataDir,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoDataDir => write!(
                f,
                "no data directory available; pass --data-dir or set {DATA_DIR_ENV}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub log_spec: String,
}

impl AppConfig {
    /// Resolves configuration from the command line, then the environment, then
    /// platform defaults.
    pub fn resolve(data_dir_flag: Option<PathBuf>) -> Result<Self, ConfigError> {
        let data_dir = resolve_data_dir(
            data_dir_flag,
            non_blank_env(DATA_DIR_ENV),
            dirs::data_dir(),
        )?;
        let log_spec = resolve_log_spec(non_blank_env(LOG_ENV), non_blank_env("RUST_LOG"));
        Ok(Self { data_dir, log_spec })
    }
}

fn non_blank_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

pub fn resolve_data_dir(
    flag: Option<PathBuf>,
    env_value: Option<String>,
    platform_data_dir: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    flag.or_else(|| env_value.map(PathBuf::from))
        .or_else(|| platform_data_dir.map(|dir| dir.join(APP_DIR_NAME)))
        .ok_or(ConfigError::NoDataDir)
}

// Keep dependency logs at WARN by default; our crate is more verbose in debug builds.
pub fn resolve_log_spec(app_value: Option<String>, rust_log: Option<String>) -> String {
    let default_spec = if cfg!(debug_assertions) {
        "warn,taskpad_lib=debug"
    } else {
        "warn,taskpad_lib=info"
    };
    app_value
        .or(rust_log)
        .unwrap_or_else(|| default_spec.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_flag_wins_over_env_and_platform() {
        let dir = resolve_data_dir(
            Some(PathBuf::from("/flag")),
            Some("/env".to_string()),
            Some(PathBuf::from("/platform")),
        )
        .unwrap();
        assert_eq!(dir, PathBuf::from("/flag"));
    }

    #[test]
    fn data_dir_env_wins_over_platform() {
        let dir = resolve_data_dir(None, Some("/env".to_string()), Some(PathBuf::from("/p")))
            .unwrap();
        assert_eq!(dir, PathBuf::from("/env"));
    }

    #[test]
    fn data_dir_falls_back_to_platform_app_dir() {
        let dir = resolve_data_dir(None, None, Some(PathBuf::from("/p"))).unwrap();
        assert_eq!(dir, PathBuf::from("/p").join(APP_DIR_NAME));
        assert!(matches!(
            resolve_data_dir(None, None, None),
            Err(ConfigError::NoDataDir)
        ));
    }

    #[test]
    fn log_spec_precedence() {
        assert_eq!(
            resolve_log_spec(Some("trace".to_string()), Some("info".to_string())),
            "trace"
        );
        assert_eq!(resolve_log_spec(None, Some("info".to_string())), "info");
        assert!(resolve_log_spec(None, None).starts_with("warn,taskpad_lib="));
    }
}
