//! INI file configuration adapter.

use crate::domain::error::TradelabError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TradelabError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| TradelabError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, TradelabError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| TradelabError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, TradelabError> {
        match self.get_string(section, key) {
            None => Ok(default),
            Some(v) => Self::parse_bool(&v).ok_or_else(|| TradelabError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("'{v}' is not a boolean"),
            }),
        }
    }
}
