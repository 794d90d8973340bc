use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// The search extension; the UI talks to its API, so it must be on for the UI to be served.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SearchConfig {
    pub enable: Option<bool>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct UiConfig {
    pub enable: Option<bool>,
    /// Directory holding a local UI build. Empty means use the bundled build.
    pub content_path: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ExtensionsConfig {
    pub search: Option<SearchConfig>,
    pub ui: Option<UiConfig>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub web: WebConfig,
    pub extensions: ExtensionsConfig,
}

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Serve the UI from this directory instead of the bundled build
    #[arg(long, value_name = "DIR")]
    pub ui_content_path: Option<String>,
}

impl AppConfig {
    pub fn new(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config_builder = Config::builder();

        // Add configuration from file if specified
        if let Some(config_path) = &args.config {
            config_builder = config_builder.add_source(File::from(config_path.as_path()));
        } else {
            // Check for config in default locations
            let default_locations = vec![
                "config.toml",
                "config/config.toml",
                "/etc/registry-ui/config.toml",
            ];

            for location in default_locations {
                if Path::new(location).exists() {
                    config_builder =
                        config_builder.add_source(File::new(location, config::FileFormat::Toml));
                    break;
                }
            }
        }

        // REGISTRY_UI__EXTENSIONS__UI__CONTENT_PATH=/srv/ui and friends
        config_builder = config_builder.add_source(
            Environment::with_prefix("REGISTRY_UI")
                .prefix_separator("__")
                .separator("__"),
        );

        let mut config: AppConfig = config_builder.build()?.try_deserialize()?;
        config.apply_cli(args);

        Ok(config)
    }

    fn apply_cli(&mut self, args: &CliArgs) {
        if let Some(host) = &args.host {
            self.web.host = host.clone();
        }
        if let Some(port) = args.port {
            self.web.port = port;
        }
        if let Some(content_path) = &args.ui_content_path {
            self.extensions
                .ui
                .get_or_insert_with(UiConfig::default)
                .content_path = content_path.clone();
        }
    }

    /// A present section with no explicit `enable` counts as enabled.
    pub fn is_search_enabled(&self) -> bool {
        self.extensions
            .search
            .as_ref()
            .is_some_and(|search| search.enable.unwrap_or(true))
    }

    pub fn is_ui_enabled(&self) -> bool {
        self.is_search_enabled()
            && self
                .extensions
                .ui
                .as_ref()
                .is_some_and(|ui| ui.enable.unwrap_or(true))
    }

    /// The configured local build directory, or "" when the bundled build should be used.
    pub fn ui_content_path(&self) -> &str {
        self.extensions
            .ui
            .as_ref()
            .map(|ui| ui.content_path.as_str())
            .unwrap_or("")
    }
}
