//! Path resolution for EchecEtMatch files.
//!
//! ```text
//! <config_dir>/echec/          # ~/.config/echec on Linux
//! └── config.toml              # Application configuration
//! ```

use echec_core::EchecError;
use echec_core::error::Result;
use std::path::PathBuf;

const APP_DIR: &str = "echec";
const CONFIG_FILE: &str = "config.toml";

pub struct EchecPaths;

impl EchecPaths {
    /// Returns the configuration directory, honoring an explicit override.
    pub fn config_dir(custom: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(dir) = custom {
            return Ok(dir);
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| EchecError::config("cannot determine the configuration directory"))
    }

    /// Returns the path of `config.toml`.
    pub fn config_file(custom_dir: Option<PathBuf>) -> Result<PathBuf> {
        Ok(Self::config_dir(custom_dir)?.join(CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_dir_is_used_verbatim() {
        let file = EchecPaths::config_file(Some(PathBuf::from("/tmp/echec-test"))).unwrap();
        assert_eq!(file, PathBuf::from("/tmp/echec-test/config.toml"));
    }
}
