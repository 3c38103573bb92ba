//! Runtime configuration: which store to use, where it lives, and which
//! policy new items get.
use crate::database::db::SqliteStore;
use crate::error::StoreError;
use crate::export::json::JsonStore;
use crate::models::Policy;
use crate::store::ItemStore;
use directories::ProjectDirs;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    #[default]
    Json,
    Sqlite,
}

impl Backend {
    fn default_file_name(self) -> &'static str {
        match self {
            Backend::Json => "timequest.json",
            Backend::Sqlite => "timequest.sqlite3",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Json => write!(f, "json"),
            Backend::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Backend::Json),
            "sqlite" => Ok(Backend::Sqlite),
            other => Err(format!("unknown backend '{other}', expected 'json' or 'sqlite'")),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub data_path: PathBuf,
    pub backend: Backend,
    pub policy: Policy,
}

impl Config {
    /// Fills in the data path when none was given: the platform data
    /// directory if one can be determined, the working directory otherwise.
    pub fn resolve(data_path: Option<PathBuf>, backend: Backend, policy: Policy) -> Self {
        let data_path = data_path.unwrap_or_else(|| {
            let dir = ProjectDirs::from("com", "timequest", "timequest")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .unwrap_or_default();
            dir.join(backend.default_file_name())
        });
        Self {
            data_path,
            backend,
            policy,
        }
    }

    pub fn open_store(&self) -> Result<Box<dyn ItemStore>, StoreError> {
        Ok(match self.backend {
            Backend::Json => Box::new(JsonStore::new(&self.data_path)),
            Backend::Sqlite => Box::new(SqliteStore::open(&self.data_path)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let config = Config::resolve(Some(PathBuf::from("cards.json")), Backend::Json, Policy::Simple);
        assert_eq!(config.data_path, PathBuf::from("cards.json"));
        assert_eq!(config.policy, Policy::Simple);
    }

    #[test]
    fn test_default_file_name_follows_backend() {
        let json = Config::resolve(None, Backend::Json, Policy::Light);
        assert!(json.data_path.ends_with("timequest.json"));
        let sqlite = Config::resolve(None, Backend::Sqlite, Policy::Light);
        assert!(sqlite.data_path.ends_with("timequest.sqlite3"));
    }

    #[test]
    fn test_parse_backend() {
        assert_eq!("SQLite".parse::<Backend>(), Ok(Backend::Sqlite));
        assert_eq!("json".parse::<Backend>(), Ok(Backend::Json));
        assert!("csv".parse::<Backend>().is_err());
    }

    #[test]
    fn test_open_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::resolve(
            Some(dir.path().join("items.sqlite3")),
            Backend::Sqlite,
            Policy::Light,
        );
        let mut store = config.open_store().unwrap();
        assert!(store.load_all().unwrap().items.is_empty());
    }
}
