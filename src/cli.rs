use std::path::PathBuf;
use std::time::Duration;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

use crate::analysis::AnalysisMode;
use crate::context::EngineConfig;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub overwrite: bool,
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub dry_run: Option<PathBuf>,
    pub verbose: bool,
}

impl CliArgs {
    pub fn parse() -> Self {
        Self::from_matches(&cli().get_matches())
    }

    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Ok(Self::from_matches(&cli().try_get_matches_from(args)?))
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        CliArgs {
            overwrite: matches.get_flag("overwrite"),
            concurrency: matches.get_one::<usize>("concurrency").copied(),
            timeout_secs: matches.get_one::<u64>("timeout").copied(),
            dry_run: matches.get_one::<PathBuf>("dry-run").cloned(),
            verbose: matches.get_flag("verbose"),
        }
    }

    /// Command-line flags win over whatever the environment configured.
    pub fn apply(&self, config: &mut EngineConfig) {
        if self.overwrite {
            config.mode = AnalysisMode::Overwrite;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency.max(1);
        }
        if let Some(secs) = self.timeout_secs {
            config.query_timeout = Duration::from_secs(secs);
        }
    }
}

fn cli() -> Command {
    Command::new("deck-analysis")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Classify deck cards by role and store one analysis per deck")
        .arg(
            Arg::new("overwrite")
                .long("overwrite")
                .help("Recompute and replace the analysis of every deck")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("concurrency")
                .short('j')
                .long("concurrency")
                .value_name("N")
                .help("Number of decks analyzed at once")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECS")
                .help("Deadline for each database call")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .value_name("FIXTURE")
                .help("Analyze decks from a JSON fixture in memory instead of the database")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue),
        )
}
