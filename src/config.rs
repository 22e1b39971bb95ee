use std::path::PathBuf;

use log::warn;
use serde::Deserialize;

pub const APP_DIR: &str = "daywheel";

const DEFAULT_USERS: [&str; 2] = ["Gunjishima", "Yumi"];
const DEFAULT_STEP_MINUTES: u16 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// The fixed set of people who can submit schedules.
    pub users: Vec<String>,
    pub data_file: PathBuf,
    pub log_file: PathBuf,
    pub time_step_minutes: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            users: DEFAULT_USERS.iter().map(|u| u.to_string()).collect(),
            data_file: data_dir().join("schedule.toml"),
            log_file: data_dir().join("daywheel.log"),
            time_step_minutes: DEFAULT_STEP_MINUTES,
        }
    }
}

impl Config {
    /// Read `config.toml` from the config dir, falling back to defaults for
    /// a missing file or anything that fails to parse.
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_toml(&content),
            Err(e) => {
                warn!("could not read {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn from_toml(content: &str) -> Self {
        match toml::from_str::<ConfigFile>(content) {
            Ok(file) => file.into_config(),
            Err(e) => {
                warn!("ignoring invalid config: {e}");
                Self::default()
            }
        }
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    users: Option<Vec<String>>,
    data_file: Option<PathBuf>,
    log_file: Option<PathBuf>,
    time_step_minutes: Option<u16>,
}

impl ConfigFile {
    fn into_config(self) -> Config {
        let mut config = Config::default();

        let users: Vec<String> = self
            .users
            .unwrap_or_default()
            .into_iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();
        if !users.is_empty() {
            config.users = users;
        }
        if let Some(p) = self.data_file {
            config.data_file = p;
        }
        if let Some(p) = self.log_file {
            config.log_file = p;
        }
        if let Some(step) = self.time_step_minutes.filter(|s| (1..=720).contains(s)) {
            config.time_step_minutes = step;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Config::from_toml(""), Config::default());
    }

    #[test]
    fn overrides_apply() {
        let config = Config::from_toml(
            r#"
            users = ["Aki", " ", "Ren"]
            data_file = "/tmp/plans.toml"
            time_step_minutes = 15
            "#,
        );
        assert_eq!(config.users, ["Aki", "Ren"]);
        assert_eq!(config.data_file, PathBuf::from("/tmp/plans.toml"));
        assert_eq!(config.time_step_minutes, 15);
        assert_eq!(config.log_file, Config::default().log_file);
    }

    #[test]
    fn bad_values_fall_back() {
        let config = Config::from_toml("users = []\ntime_step_minutes = 0");
        assert_eq!(config.users, Config::default().users);
        assert_eq!(config.time_step_minutes, 30);

        assert_eq!(Config::from_toml("users = 3"), Config::default());
    }
}
