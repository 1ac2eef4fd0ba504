use std::path::{Path, PathBuf};

use serde::{
    Deserialize,
    Serialize
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Menu configuration not found at '{0}'")]
    Missing(PathBuf),

    #[error("Could not read menu configuration, reason='{0}'")]
    IoError(#[from] std::io::Error),

    #[error("Could not parse menu configuration, reason='{0}'")]
    ParseError(#[from] serde_json::Error),

    #[error("Menu item '{item}' names unknown action '{action}'")]
    UnknownAction {
        item: String,
        action: String,
    },
}

/// One button of the radial menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "MethodName")]
    pub method_name: String,
}

/// Ordered button layout, authored as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuConfig {
    #[serde(rename = "NodeMenuItems")]
    pub node_menu_items: Vec<MenuItem>,
}

impl MenuConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path)?;
        log::debug!("Loaded menu configuration from {}", path.display());
        Self::from_json(&json)
    }

    /// The six-button hexagonal layout used when no file is supplied.
    pub fn hexagonal_default() -> Self {
        let items = [
            ("Info", "ListInfo"),
            ("Enrich", "Enrich"),
            ("Expand", "Expand"),
            ("Mitigate", "Mitigate"),
            ("Reset", "ResetStory"),
            ("Back", "Back"),
        ];
        Self {
            node_menu_items: items
                .iter()
                .map(|(name, method_name)| MenuItem {
                    name: name.to_string(),
                    method_name: method_name.to_string(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_authored_layout() {
        let json = r#"{"NodeMenuItems":[{"Name":"Info","MethodName":"ListInfo"},{"Name":"Back","MethodName":"Back"}]}"#;
        let config = MenuConfig::from_json(json).unwrap();
        assert_eq!(config.node_menu_items.len(), 2);
        assert_eq!(config.node_menu_items[0].name, "Info");
        assert_eq!(config.node_menu_items[0].method_name, "ListInfo");
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = MenuConfig::from_path("/definitely/not/here/menu.json").unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let err = MenuConfig::from_json("{\"NodeMenuItems\": 3}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_reads_from_file() {
        let path = std::env::temp_dir().join(format!("holograph_menu_{}.json", std::process::id()));
        std::fs::write(&path, serde_json::to_string(&MenuConfig::hexagonal_default()).unwrap()).unwrap();
        let config = MenuConfig::from_path(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config, MenuConfig::hexagonal_default());
    }
}
