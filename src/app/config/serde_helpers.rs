use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;
use tracing::warn;

pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(duration.as_millis() as u64)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = u64::deserialize(deserializer)?;
    Ok(Duration::from_millis(millis))
}

/// Load and parse an environment variable into `target`.
/// A missing variable leaves `target` untouched; an unparsable one is
/// reported and ignored so the previous value stays in effect.
pub fn load_env_var<T>(name: &str, target: &mut Option<T>)
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if let Ok(value) = std::env::var(name) {
        match value.trim().parse() {
            Ok(parsed) => *target = Some(parsed),
            Err(e) => warn!(variable = name, error = %e, "ignoring malformed environment value"),
        }
    }
}

/// Load a comma-separated list environment variable. Empty items are dropped.
pub fn load_env_list(name: &str, target: &mut Option<Vec<String>>) {
    if let Ok(value) = std::env::var(name) {
        *target = Some(split_list(&value));
    }
}

/// Load a PathBuf environment variable.
pub fn load_env_path(name: &str, target: &mut Option<std::path::PathBuf>) {
    if let Ok(value) = std::env::var(name) {
        *target = Some(std::path::PathBuf::from(value));
    }
}

pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(split_list("").is_empty());
    }
}
