//! Configuration access port trait.
//!
//! Missing keys fall back to the caller's default; present but malformed
//! values are errors.

use crate::domain::error::TradelabError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, TradelabError> {
        parse_or(self.get_string(section, key), section, key, default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, TradelabError> {
        parse_or(self.get_string(section, key), section, key, default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, TradelabError> {
        parse_or(self.get_string(section, key), section, key, default)
    }
}

fn parse_or<T>(
    raw: Option<String>,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, TradelabError>
where
    T: std::str::FromStr,
{
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value.parse().map_err(|_| TradelabError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("cannot parse '{value}'"),
        }),
    }
}
