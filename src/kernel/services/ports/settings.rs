use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Supplies the extension appended to new file names.
pub trait DefaultExtensionProvider: Send + Sync {
    fn default_extension(&self) -> Option<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_extension")]
    pub default_extension: Option<String>,
    #[serde(default)]
    pub strings: LocalizedStrings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trash_dir: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub restore_session: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalizedStrings {
    #[serde(default = "default_untitled_file")]
    pub untitled_file: String,
    #[serde(default = "default_untitled_folder")]
    pub untitled_folder: String,
}

fn default_extension() -> Option<String> {
    Some("txt".to_string())
}

fn default_true() -> bool {
    true
}

fn default_untitled_file() -> String {
    "Untitled".to_string()
}

fn default_untitled_folder() -> String {
    "untitled folder".to_string()
}

impl Default for LocalizedStrings {
    fn default() -> Self {
        Self {
            untitled_file: default_untitled_file(),
            untitled_folder: default_untitled_folder(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_extension: default_extension(),
            strings: LocalizedStrings::default(),
            trash_dir: None,
            restore_session: true,
        }
    }
}

impl DefaultExtensionProvider for Settings {
    fn default_extension(&self) -> Option<String> {
        self.default_extension
            .as_deref()
            .map(|ext| ext.trim_start_matches('.'))
            .filter(|ext| !ext.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.default_extension.as_deref(), Some("txt"));
        assert_eq!(settings.strings.untitled_file, "Untitled");
        assert_eq!(settings.strings.untitled_folder, "untitled folder");
        assert!(settings.restore_session);
        assert!(settings.trash_dir.is_none());
    }

    #[test]
    fn default_extension_is_normalized() {
        let mut settings = Settings::default();
        settings.default_extension = Some(".md".to_string());
        assert_eq!(settings.default_extension().as_deref(), Some("md"));

        settings.default_extension = Some(String::new());
        assert_eq!(settings.default_extension(), None);

        settings.default_extension = None;
        assert_eq!(settings.default_extension(), None);
    }

    #[test]
    fn explicit_null_extension_disables_it() {
        let settings: Settings =
            serde_json::from_str(r#"{"default_extension": null}"#).unwrap();
        assert_eq!(settings.default_extension(), None);
    }
}
