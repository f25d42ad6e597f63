use std::path::Path;
use tracing::warn;

use crate::config::FontConfig;
use crate::options::FontSpec;

/// Operating system family, as keyed in per-OS font maps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
    Darwin,
}

impl Platform {
    pub fn current() -> Self {
        match std::env::consts::OS {
            "windows" => Platform::Windows,
            "macos" => Platform::Darwin,
            _ => Platform::Linux,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Linux => "linux",
            Platform::Darwin => "darwin",
        }
    }
}

/// Resolves the font file handed to `drawtext`
#[derive(Debug, Clone)]
pub struct FontResolver {
    config: FontConfig,
    platform: Platform,
}

impl FontResolver {
    pub fn new(config: FontConfig) -> Self {
        Self::with_platform(config, Platform::current())
    }

    pub fn with_platform(config: FontConfig, platform: Platform) -> Self {
        Self { config, platform }
    }

    /// Font path after OS selection, unescaped
    pub fn resolve(&self, font: Option<&FontSpec>) -> String {
        match font {
            Some(FontSpec::Path(path)) if !path.is_empty() => path.clone(),
            Some(FontSpec::PerOs(paths)) => match paths.get(self.platform.key()) {
                Some(path) if !path.is_empty() => path.clone(),
                _ => {
                    warn!(
                        "No font configured for '{}', using default font",
                        self.platform.key()
                    );
                    self.default_font()
                }
            },
            _ => self.default_font(),
        }
    }

    /// Font path escaped for use inside a filter graph
    pub fn filter_path(&self, font: Option<&FontSpec>) -> String {
        escape_font_path(
            &self.resolve(font),
            self.platform,
            self.config.escape_forward_slashes,
        )
    }

    fn default_font(&self) -> String {
        display_path(&self.config.default_font).replace('\\', "/")
    }
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Escape separators and drive colons on Windows; other platforms pass through
pub fn escape_font_path(path: &str, platform: Platform, escape_forward_slashes: bool) -> String {
    if platform != Platform::Windows {
        return path.to_string();
    }

    let mut escaped = path.replace('\\', r"\\\");
    if escape_forward_slashes {
        escaped = escaped.replace('/', r"\\/");
    }
    escaped.replace(':', r"\:")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn config() -> FontConfig {
        FontConfig {
            default_font: PathBuf::from("resources\\fonts\\LiberationSans-Regular.ttf"),
            escape_forward_slashes: false,
        }
    }

    #[test]
    fn test_default_font_uses_forward_slashes() {
        let resolver = FontResolver::with_platform(config(), Platform::Linux);
        assert_eq!(resolver.resolve(None), "resources/fonts/LiberationSans-Regular.ttf");
    }

    #[test]
    fn test_per_os_font() {
        let mut paths = BTreeMap::new();
        paths.insert("linux".to_string(), "/usr/share/fonts/arial.ttf".to_string());
        paths.insert("windows".to_string(), "C:\\Windows\\Fonts\\arial.ttf".to_string());
        let spec = FontSpec::PerOs(paths);

        let linux = FontResolver::with_platform(config(), Platform::Linux);
        assert_eq!(linux.filter_path(Some(&spec)), "/usr/share/fonts/arial.ttf");

        let windows = FontResolver::with_platform(config(), Platform::Windows);
        assert_eq!(
            windows.filter_path(Some(&spec)),
            r"C\:\\\Windows\\\Fonts\\\arial.ttf"
        );

        let darwin = FontResolver::with_platform(config(), Platform::Darwin);
        assert_eq!(darwin.resolve(Some(&spec)), "resources/fonts/LiberationSans-Regular.ttf");
    }

    #[test]
    fn test_forward_slash_escaping_is_opt_in() {
        assert_eq!(
            escape_font_path("C:/Fonts/arial.ttf", Platform::Windows, false),
            r"C\:/Fonts/arial.ttf"
        );
        assert_eq!(
            escape_font_path("C:/Fonts/arial.ttf", Platform::Windows, true),
            r"C\:\\/Fonts\\/arial.ttf"
        );
        assert_eq!(
            escape_font_path("C:/Fonts/arial.ttf", Platform::Linux, true),
            "C:/Fonts/arial.ttf"
        );
    }
}
