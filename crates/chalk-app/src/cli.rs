//! CLI argument definitions for the Chalk application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Chalk - a labor-law assistant for the perfume-sector collective agreement.
#[derive(Parser, Debug)]
#[command(name = "chalk", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve the chat page and HTTP API (default).
    Serve {
        /// API server port.
        #[arg(short = 'p', long = "port")]
        port: Option<u16>,

        /// Address to bind.
        #[arg(long = "host")]
        host: Option<String>,
    },
    /// Chat in the terminal.
    Chat {
        /// Document to attach to the first question.
        #[arg(short = 'd', long = "document")]
        document: Option<PathBuf>,
    },
    /// Print the text extracted from a PDF or Word file.
    Extract {
        path: PathBuf,
    },
}

impl CliArgs {
    /// The subcommand to run; `serve` when none is given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve {
            port: None,
            host: None,
        })
    }

    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > CHALK_CONFIG env var > ~/.chalk/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        self.resolve_config_path_with(std::env::var("CHALK_CONFIG").ok())
    }

    fn resolve_config_path_with(&self, env_path: Option<String>) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Some(p) = env_path.filter(|p| !p.trim().is_empty()) {
            return PathBuf::from(p);
        }
        default_config_path()
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".chalk").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".chalk").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults_to_serve() {
        let args = CliArgs::try_parse_from(["chalk"]).unwrap();
        assert_eq!(
            args.command(),
            Command::Serve {
                port: None,
                host: None
            }
        );
    }

    #[test]
    fn test_serve_flags() {
        let args = CliArgs::try_parse_from(["chalk", "serve", "-p", "9000", "--host", "0.0.0.0"])
            .unwrap();
        assert_eq!(
            args.command(),
            Command::Serve {
                port: Some(9000),
                host: Some("0.0.0.0".into())
            }
        );
    }

    #[test]
    fn test_chat_with_document_and_global_flags() {
        let args = CliArgs::try_parse_from([
            "chalk",
            "chat",
            "--document",
            "recibo.pdf",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(
            args.command(),
            Command::Chat {
                document: Some(PathBuf::from("recibo.pdf"))
            }
        );
        assert_eq!(args.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_extract_requires_path() {
        assert!(CliArgs::try_parse_from(["chalk", "extract"]).is_err());
        let args = CliArgs::try_parse_from(["chalk", "extract", "cct.docx"]).unwrap();
        assert_eq!(
            args.command(),
            Command::Extract {
                path: PathBuf::from("cct.docx")
            }
        );
    }

    #[test]
    fn test_config_path_priority() {
        let args = CliArgs::try_parse_from(["chalk", "-c", "/etc/chalk.toml"]).unwrap();
        assert_eq!(
            args.resolve_config_path_with(Some("/tmp/env.toml".into())),
            PathBuf::from("/etc/chalk.toml")
        );

        let args = CliArgs::try_parse_from(["chalk"]).unwrap();
        assert_eq!(
            args.resolve_config_path_with(Some("/tmp/env.toml".into())),
            PathBuf::from("/tmp/env.toml")
        );
        assert!(args
            .resolve_config_path_with(None)
            .ends_with("config.toml"));
    }
}
