use clap::Parser;
use eyre::{Context, Result};

use crate::config::{self, Configuration, load_configuration, lookup_config_path};

#[derive(Debug, Parser)]
#[command(
    version,
    about,
    long_about = r#"A web backend that generates educational chatbot personas and chats with them

Default configuration file location looks up in the following order:
    * $XDG_CONFIG_HOME/teachbot/config.toml
    * $HOME/.config/teachbot/config.toml
    * $HOME/.teachbot.toml

OPENAI_API_KEY and GEMINI_API_KEY fill in API keys missing from the file.
"#,
    disable_version_flag = true
)]
pub struct Command {
    /// Configuration file path
    #[arg(short, long, value_name = "PATH")]
    config: Option<String>,

    /// Listen address, overrides server.listen
    #[arg(short, long, value_name = "ADDR")]
    listen: Option<String>,

    /// Show the version
    #[arg(short, long)]
    version: bool,
}

impl Command {
    pub fn new() -> Command {
        Self::parse()
    }

    pub fn get_config(&self) -> Result<Configuration> {
        let config_path = self
            .config
            .clone()
            .unwrap_or_else(|| lookup_config_path().unwrap_or_default());

        let mut config = if config_path.is_empty() {
            // No config path is specified just use the default config
            Configuration::default()
        } else {
            load_configuration(config_path.as_str()).wrap_err("loading configuration")?
        };

        if let Some(listen) = &self.listen {
            config.server.listen = listen.clone();
        }
        Ok(config.with_env(|key| std::env::var(key).ok()))
    }

    pub fn version(&self) -> bool {
        self.version
    }

    pub fn print_version(&self) {
        println!("{}", config::version())
    }
}
