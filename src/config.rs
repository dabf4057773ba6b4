use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{IngestError, IngestResult};

pub const DEFAULT_DB_PATH: &str = ".cache/nuada/nuada.sqlite";

pub fn load_dotenv() {
    match dotenv::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded environment file"),
        Err(err) if err.not_found() => {}
        Err(err) => debug!(error = %err, "ignored unreadable environment file"),
    }
}

// The file wins when both the variable and its `_FILE` counterpart are set.
#[derive(Debug, Clone, Default)]
pub struct Secret {
    pub name: &'static str,
    pub value: Option<String>,
    pub file: Option<PathBuf>,
}

impl Secret {
    pub fn resolve(&self) -> IngestResult<Option<String>> {
        if let Some(path) = &self.file {
            return read_secret_file(self.name, path).map(Some);
        }
        Ok(self
            .value
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned))
    }

    pub fn require(&self) -> IngestResult<String> {
        self.resolve()?.ok_or_else(|| {
            IngestError::Configuration(format!(
                "{name} is not set (use {name} or {name}_FILE)",
                name = self.name
            ))
        })
    }
}

fn read_secret_file(name: &str, path: &Path) -> IngestResult<String> {
    let raw = fs::read_to_string(path).map_err(|err| {
        IngestError::Configuration(format!(
            "failed to read {name}_FILE {}: {err}",
            path.display()
        ))
    })?;
    let value = raw.trim();
    if value.is_empty() {
        return Err(IngestError::Configuration(format!(
            "{name}_FILE {} is empty",
            path.display()
        )));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn secret_file_overrides_value() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "  from-file  ").expect("write secret");

        let secret = Secret {
            name: "SOURCE_KEY_NYT",
            value: Some("from-env".to_string()),
            file: Some(file.path().to_path_buf()),
        };
        assert_eq!(secret.require().expect("secret"), "from-file");
    }

    #[test]
    fn blank_secret_is_missing() {
        let secret = Secret {
            name: "SOURCE_KEY_GUARDIAN",
            value: Some("   ".to_string()),
            file: None,
        };
        assert_eq!(secret.resolve().expect("resolve"), None);

        let err = secret.require().expect_err("missing secret");
        assert!(matches!(err, IngestError::Configuration(_)));
        assert!(err.to_string().contains("SOURCE_KEY_GUARDIAN_FILE"));
    }

    #[test]
    fn unreadable_secret_file_is_configuration_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let secret = Secret {
            name: "DB_KEY",
            value: None,
            file: Some(dir.path().join("missing")),
        };
        assert!(matches!(
            secret.resolve(),
            Err(IngestError::Configuration(_))
        ));
    }
}
