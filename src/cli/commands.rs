//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: run the verification loop over a prompt
//! - steps: show which steps a configuration selects
//! - score: evaluate text with ece, rbb or tofu

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// loopos - depth-gated verification loop
#[derive(Parser, Debug)]
#[command(name = "loopos")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Loop selection flags shared by `run` and `steps`
#[derive(Args, Debug, Clone, Default)]
pub struct LoopArgs {
    /// Run the deep sequence (critique and refinement)
    #[arg(long, overrides_with = "no_deep")]
    pub deep: bool,

    /// Run the shallow sequence even if configuration enables deep mode
    #[arg(long, overrides_with = "deep")]
    pub no_deep: bool,

    /// Number of steps to execute (1-4)
    #[arg(short, long)]
    pub depth: Option<u8>,
}

impl LoopArgs {
    /// Deep-mode choice made on the command line, if any
    pub fn deep_mode(&self) -> Option<bool> {
        match (self.deep, self.no_deep) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the verification loop over a prompt
    Run {
        /// Prompt to answer (may be empty)
        prompt: String,

        #[command(flatten)]
        loop_args: LoopArgs,

        /// Print the full run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the steps a configuration would execute
    Steps {
        #[command(flatten)]
        loop_args: LoopArgs,
    },

    /// Score text or calibration data
    Score {
        #[command(subcommand)]
        command: ScoreCommands,

        /// Print the score record as JSON
        #[arg(long, global = true)]
        json: bool,
    },
}

/// Scoring subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ScoreCommands {
    /// Expected calibration error
    Ece {
        /// Comma-separated probabilities in [0, 1]
        #[arg(short, long, value_delimiter = ',', required = true)]
        probabilities: Vec<f64>,

        /// Comma-separated labels (0 or 1)
        #[arg(short, long, value_delimiter = ',', required = true)]
        labels: Vec<u8>,

        /// Number of calibration bins
        #[arg(short, long, default_value_t = 10)]
        bins: usize,
    },

    /// Hedge/anchor balance
    Rbb {
        /// Text to score
        text: String,
    },

    /// Semantic density (fluff per entity)
    Tofu {
        /// Text to score
        text: String,

        /// Comma-separated stopwords replacing the default set
        #[arg(short, long, value_delimiter = ',')]
        stopwords: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["loopos"]).is_err());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["loopos", "-v", "steps"]).unwrap();
        assert!(cli.is_verbose());
    }

    #[test]
    fn test_cli_config_option() {
        let cli = Cli::try_parse_from(["loopos", "-c", "/path/to/loopos.yml", "steps"]).unwrap();
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/path/to/loopos.yml")));
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["loopos", "run", "Summarize the findings."]).unwrap();
        match cli.command {
            Commands::Run { prompt, loop_args, json } => {
                assert_eq!(prompt, "Summarize the findings.");
                assert_eq!(loop_args.deep_mode(), None);
                assert!(loop_args.depth.is_none());
                assert!(!json);
            }
            _ => panic!("Expected run command"),
        }
    }

    #[test]
    fn test_run_deep_with_depth() {
        let cli = Cli::try_parse_from(["loopos", "run", "--deep", "--depth", "4", "--json", "x"]).unwrap();
        match cli.command {
            Commands::Run { loop_args, json, .. } => {
                assert_eq!(loop_args.deep_mode(), Some(true));
                assert_eq!(loop_args.depth, Some(4));
                assert!(json);
            }
            _ => panic!("Expected run command"),
        }
    }

    #[test]
    fn test_no_deep_flag() {
        let cli = Cli::try_parse_from(["loopos", "steps", "--no-deep"]).unwrap();
        match cli.command {
            Commands::Steps { loop_args } => assert_eq!(loop_args.deep_mode(), Some(false)),
            _ => panic!("Expected steps command"),
        }
    }

    #[test]
    fn test_last_deep_flag_wins() {
        let cli = Cli::try_parse_from(["loopos", "steps", "--deep", "--no-deep"]).unwrap();
        match cli.command {
            Commands::Steps { loop_args } => assert_eq!(loop_args.deep_mode(), Some(false)),
            _ => panic!("Expected steps command"),
        }
    }

    #[test]
    fn test_run_accepts_empty_prompt() {
        let cli = Cli::try_parse_from(["loopos", "run", ""]).unwrap();
        assert!(matches!(cli.command, Commands::Run { ref prompt, .. } if prompt.is_empty()));
    }

    #[test]
    fn test_steps_command() {
        let cli = Cli::try_parse_from(["loopos", "steps", "-d", "1"]).unwrap();
        match cli.command {
            Commands::Steps { loop_args } => assert_eq!(loop_args.depth, Some(1)),
            _ => panic!("Expected steps command"),
        }
    }

    #[test]
    fn test_score_ece() {
        let cli = Cli::try_parse_from([
            "loopos", "score", "ece", "-p", "0.0,1.0", "-l", "0,1", "--bins", "5",
        ])
        .unwrap();
        match cli.command {
            Commands::Score {
                command: ScoreCommands::Ece { probabilities, labels, bins },
                json,
            } => {
                assert_eq!(probabilities, vec![0.0, 1.0]);
                assert_eq!(labels, vec![0, 1]);
                assert_eq!(bins, 5);
                assert!(!json);
            }
            _ => panic!("Expected score ece command"),
        }
    }

    #[test]
    fn test_score_ece_requires_labels() {
        assert!(Cli::try_parse_from(["loopos", "score", "ece", "-p", "0.5"]).is_err());
    }

    #[test]
    fn test_score_tofu_with_stopwords_and_json() {
        let cli = Cli::try_parse_from(["loopos", "score", "tofu", "The Widget", "-s", "the,a", "--json"]).unwrap();
        match cli.command {
            Commands::Score {
                command: ScoreCommands::Tofu { text, stopwords },
                json,
            } => {
                assert_eq!(text, "The Widget");
                assert_eq!(stopwords, vec!["the", "a"]);
                assert!(json);
            }
            _ => panic!("Expected score tofu command"),
        }
    }

    #[test]
    fn test_score_rbb() {
        let cli = Cli::try_parse_from(["loopos", "score", "rbb", "According to the data"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Score {
                command: ScoreCommands::Rbb { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_cli_debug_assert() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
