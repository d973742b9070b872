use beltloader_data::{DataLoader, RecordTables};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileLoaderError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads tables and configuration from JSON files on disk.
///
/// Without a tables path the bundled tables are used. Configuration names
/// are file paths.
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    tables: Option<PathBuf>,
}

impl FileLoader {
    pub const fn new(tables: Option<PathBuf>) -> Self {
        Self { tables }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, FileLoaderError> {
    let raw = fs::read_to_string(path).map_err(|source| FileLoaderError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| FileLoaderError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl DataLoader for FileLoader {
    type Error = FileLoaderError;

    fn load_tables(&self) -> Result<RecordTables, Self::Error> {
        match &self.tables {
            Some(path) => {
                log::debug!("loading record tables from {}", path.display());
                read_json(path)
            }
            None => Ok(RecordTables::bundled()),
        }
    }

    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: DeserializeOwned,
    {
        read_json(Path::new(config_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beltloader_data::{Category, Settings};

    fn temp_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "beltloader-loader-{label}-{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn defaults_to_bundled_tables() {
        let tables = FileLoader::new(None).load_tables().unwrap();
        assert!(tables.contains(Category::TransportBelt, "transport-belt"));
    }

    #[test]
    fn reads_settings_files() {
        let path = temp_dir("settings").join("settings.json");
        fs::write(&path, r#"{"kr-loaders": true}"#).unwrap();
        let loader = FileLoader::new(None);
        let settings: Settings = loader.load_config(&path.to_string_lossy()).unwrap();
        assert!(settings.enabled("kr-loaders"));
    }

    #[test]
    fn reports_missing_and_malformed_files() {
        let dir = temp_dir("errors");
        let loader = FileLoader::new(Some(dir.join("absent.json")));
        assert!(matches!(
            loader.load_tables(),
            Err(FileLoaderError::Read { .. })
        ));

        fs::write(dir.join("broken.json"), "{ not json").unwrap();
        let loader = FileLoader::new(Some(dir.join("broken.json")));
        assert!(matches!(
            loader.load_tables(),
            Err(FileLoaderError::Parse { .. })
        ));
    }
}
