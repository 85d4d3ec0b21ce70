//! Command-line arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for mochi
#[derive(Parser, Debug)]
#[command(name = "mochi")]
#[command(author, version, about = "Check facts about cats with leader/validator consensus")]
#[command(long_about = r#"
Mochi checks claims about cats by asking an LLM twice: a leader answer and an
independent validator answer. The verdict is accepted only when they agree.

Off-topic claims get a fun cat fact instead.

Example:
  mochi check "Cats sleep for most of the day"
  mochi -v check "Кошки умеют летать" --show-last
  mochi --config mochi.yaml check "A group of cats is called a clowder"
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to YAML configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check one or more claims
    Check {
        /// Claims to check, in order
        #[arg(required = true, value_name = "CLAIM")]
        claims: Vec<String>,

        /// Print the last stored verdict after checking
        #[arg(long)]
        show_last: bool,
    },

    /// Print the oracle prompt for a claim
    Prompt {
        #[arg(value_name = "CLAIM")]
        claim: String,
    },

    /// Print the cat fact an off-topic claim maps to
    Fallback {
        #[arg(value_name = "CLAIM")]
        claim: String,
    },

    /// List available provider types
    Providers,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_with_flags() {
        let cli = Cli::try_parse_from([
            "mochi", "-vv", "check", "Cats purr", "Cats fly", "--show-last", "--config", "m.yaml",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("m.yaml")));
        match cli.command {
            Command::Check { claims, show_last } => {
                assert_eq!(claims, vec!["Cats purr", "Cats fly"]);
                assert!(show_last);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_check_requires_claim() {
        assert!(Cli::try_parse_from(["mochi", "check"]).is_err());
    }

    #[test]
    fn test_fallback() {
        let cli = Cli::try_parse_from(["mochi", "fallback", "Bread"]).unwrap();
        assert!(matches!(cli.command, Command::Fallback { claim } if claim == "Bread"));
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
