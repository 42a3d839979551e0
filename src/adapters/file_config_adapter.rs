//! INI file configuration adapter.

use crate::domain::error::StatArbError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StatArbError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::parse(content, &path.display().to_string())
    }

    pub fn from_string(content: &str) -> Result<Self, StatArbError> {
        Self::parse(content.to_string(), "<string>")
    }

    fn parse(content: String, origin: &str) -> Result<Self, StatArbError> {
        let mut config = Ini::new();
        config.read(content).map_err(|reason| StatArbError::ConfigParse {
            file: origin.to_string(),
            reason,
        })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    const SAMPLE: &str = r#"
[strategy]
lookback = 150
entry_z = 2.5

[cluster]
significance = 99

[data]
dir = /srv/prices
"#;

    #[test]
    fn from_string_parses_sections() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_string("data", "dir"),
            Some("/srv/prices".to_string())
        );
        assert_eq!(adapter.get_string("strategy", "lookback"), Some("150".to_string()));
        assert_eq!(adapter.get_string("cluster", "significance"), Some("99".to_string()));
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("strategy", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn malformed_values_are_returned_verbatim() {
        let adapter = FileConfigAdapter::from_string("[strategy]\nlookback = abc\n").unwrap();
        assert_eq!(adapter.get_string("strategy", "lookback"), Some("abc".to_string()));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config(SAMPLE);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_string("strategy", "entry_z"), Some("2.5".to_string()));
    }

    #[test]
    fn from_file_missing_is_io_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/statarb.ini");
        assert!(matches!(result, Err(StatArbError::Io(_))));
    }
}
