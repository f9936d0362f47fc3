use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "trisearch")]
#[command(about = "Three-pane incremental search over an object catalog")]
pub struct Cli {
    /// Catalog JSON to search (defaults to the built-in sample catalog)
    #[arg(long, global = true)]
    pub universe: Option<String>,
    /// Timing configuration JSON
    #[arg(long, global = true)]
    pub config: Option<String>,
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Read commands from stdin, one per line (default)
    Run,
    /// Run a script and report assertion results
    Script {
        /// Path to the script file
        #[arg(short, long)]
        script: String,
        /// Seconds to wait for pending timers before giving up
        #[arg(long, default_value = "5")]
        settle_timeout: u64,
    },
    /// Score names against an abbreviation and print them in rank order
    Rank {
        /// Abbreviation to score with
        #[arg(short, long)]
        abbreviation: String,
        /// Candidate names
        names: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_run() {
        let cli = Cli::try_parse_from(["trisearch"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_script_with_global_options() {
        let cli = Cli::try_parse_from([
            "trisearch",
            "script",
            "--script",
            "smoke.script",
            "--universe",
            "catalog.json",
        ])
        .unwrap();
        assert_eq!(cli.universe.as_deref(), Some("catalog.json"));
        assert_eq!(
            cli.command,
            Some(Commands::Script {
                script: "smoke.script".to_string(),
                settle_timeout: 5
            })
        );
    }

    #[test]
    fn test_rank_collects_names() {
        let cli = Cli::try_parse_from(["trisearch", "rank", "-a", "cal", "Calendar", "Call Waiting"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Rank {
                abbreviation: "cal".to_string(),
                names: vec!["Calendar".to_string(), "Call Waiting".to_string()]
            })
        );
    }
}
