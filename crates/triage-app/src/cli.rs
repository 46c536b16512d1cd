//! CLI argument definitions for the `triage` binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use triage_core::types::{Consent, Gender, PatientProfile};

/// Conversational symptom triage assistant.
#[derive(Parser, Debug)]
#[command(name = "triage", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run an interactive dialogue in the terminal.
    Chat(ChatArgs),
    /// Serve the HTTP API.
    Serve {
        /// API server port.
        #[arg(short = 'p', long = "port")]
        port: Option<u16>,
    },
    /// Score a JSON transcript file and print level and summary.
    Score {
        /// A JSON array of `{role, content}` messages, or `{"transcript": [...]}`.
        file: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum GenderArg {
    Male,
    Female,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    #[arg(long, value_enum, default_value = "male")]
    pub gender: GenderArg,

    /// Age in full years (1-120).
    #[arg(long, default_value_t = 50)]
    pub age: u8,

    /// Comma-separated medical history, e.g. "고혈압,당뇨". Empty for none.
    #[arg(long, default_value = "고혈압")]
    pub history: String,

    /// Accept the privacy agreement without prompting.
    #[arg(short = 'y', long = "agree")]
    pub agree: bool,

    /// Do not share location; the hospital list stays empty.
    #[arg(long = "no-location")]
    pub no_location: bool,
}

impl ChatArgs {
    pub fn profile(&self) -> PatientProfile {
        PatientProfile {
            gender: match self.gender {
                GenderArg::Male => Gender::Male,
                GenderArg::Female => Gender::Female,
            },
            age: self.age,
            history: self
                .history
                .split(',')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn consent(&self, privacy: bool) -> Consent {
        Consent {
            privacy,
            location: !self.no_location,
        }
    }
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > TRIAGE_CONFIG env var > ~/.triage/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("TRIAGE_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > TRIAGE_PORT env var > config file value.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Command::Serve { port: Some(p) } = self.command {
            return p;
        }
        if let Ok(val) = std::env::var("TRIAGE_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        config_port
    }

    /// Resolve the log filter.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".triage").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".triage").join("config.toml");
    }
    PathBuf::from("triage.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_defaults() {
        let args = CliArgs::parse_from(["triage", "chat"]);
        let Command::Chat(chat) = &args.command else {
            panic!("expected chat");
        };
        assert_eq!(chat.profile(), PatientProfile::default());
        assert!(chat.consent(true).location);
        assert!(!chat.agree);
    }

    #[test]
    fn test_chat_profile_flags() {
        let args = CliArgs::parse_from([
            "triage", "chat", "--gender", "female", "--age", "71", "--history", " 당뇨, ,천식 ",
            "--no-location", "-y",
        ]);
        let Command::Chat(chat) = &args.command else {
            panic!("expected chat");
        };
        let profile = chat.profile();
        assert_eq!(profile.gender, Gender::Female);
        assert_eq!(profile.age, 71);
        assert_eq!(profile.history, vec!["당뇨", "천식"]);
        assert!(!chat.consent(true).location);
        assert!(chat.agree);
    }

    #[test]
    fn test_empty_history() {
        let args = CliArgs::parse_from(["triage", "chat", "--history", ""]);
        let Command::Chat(chat) = &args.command else {
            panic!("expected chat");
        };
        assert!(chat.profile().history.is_empty());
    }

    #[test]
    fn test_port_flag_wins() {
        let args = CliArgs::parse_from(["triage", "serve", "--port", "4100"]);
        assert_eq!(args.resolve_port(3040), 4100);
    }

    #[test]
    fn test_config_flag_and_global_log_level() {
        let args = CliArgs::parse_from(["triage", "score", "t.json", "-c", "/tmp/x.toml", "-l", "debug"]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/x.toml"));
        assert_eq!(args.resolve_log_level("info"), "debug");
    }
}
