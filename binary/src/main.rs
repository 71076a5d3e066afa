use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::Verbosity;
use env_logger::Builder;

use log_skeleton::{
    classify_event_log,
    core::{
        event_data::case_centric::utils::event_log_splitter::ActivitySplitter,
        process_models::case_centric::log_skeleton::MAX_NOISE_LEVEL,
    },
    discover_log_skeleton, CheckConfig, CheckKind, EventLog, EventLogClassifier, Exportable,
    Importable, LogSkeleton, LogSkeletonDiscoveryOptions, QueryConfig,
};

/// Discover log skeletons from event logs and check event logs against them
#[derive(Debug, Parser)]
#[command(name = "log-skeleton", version, about)]
struct Cli {
    #[command(flatten)]
    verbose: Verbosity,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Discover a log skeleton from an event log (`.json` or `.json.gz`)
    Discover {
        /// Event log to discover from
        log: PathBuf,
        /// Output file (`.json` or `.csv`)
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        options: DiscoveryArgs,
        /// Name of a classifier of the event log (default: activity name)
        #[arg(long)]
        classifier: Option<String>,
    },
    /// Print the legend and the non-redundant relations of a log skeleton
    Show {
        /// Log skeleton (`.json`)
        skeleton: PathBuf,
        #[command(flatten)]
        thresholds: ThresholdArgs,
    },
    /// Check every trace of an event log against a log skeleton
    Check {
        /// Log skeleton (`.json`)
        skeleton: PathBuf,
        /// Event log to check
        log: PathBuf,
        /// Checks to run (default: all)
        #[arg(long, value_enum, value_delimiter = ',')]
        checks: Vec<CheckArg>,
        /// Stop checking a trace after its first violation
        #[arg(long)]
        stop_at_first_violation: bool,
        /// Noise level (0-20) of the same-count classes to check
        #[arg(
            long,
            default_value_t = 0,
            value_parser = clap::value_parser!(u8).range(0..=MAX_NOISE_LEVEL as i64)
        )]
        noise_level: u8,
        /// Name of a classifier of the event log (default: activity name)
        #[arg(long)]
        classifier: Option<String>,
        /// Write the conforming traces to this file
        #[arg(long)]
        conforming: Option<PathBuf>,
        /// Write the non-conforming traces to this file
        #[arg(long)]
        non_conforming: Option<PathBuf>,
    },
    /// Convert a log skeleton (`.json`) to another format (`.json` or `.csv`)
    Export {
        /// Log skeleton (`.json`)
        skeleton: PathBuf,
        /// Output file
        output: PathBuf,
    },
}

#[derive(Debug, Args)]
struct DiscoveryArgs {
    /// Maximal distance of related activities (0 = unbounded)
    #[arg(long, default_value_t = 0)]
    horizon: usize,
    /// Activity at which scans for related activities stop (repeatable)
    #[arg(long = "boundary")]
    boundary_activities: Vec<String>,
    /// Only use traces containing this activity (repeatable)
    #[arg(long = "required")]
    required_activities: Vec<String>,
    /// Only use traces not containing this activity (repeatable)
    #[arg(long = "forbidden")]
    forbidden_activities: Vec<String>,
    /// Split `ACTIVITY` when directly preceded by `PREDECESSOR` (`ACTIVITY@PREDECESSOR`, repeatable)
    #[arg(long = "split", value_parser = parse_splitter)]
    splitters: Vec<ActivitySplitter>,
}

impl From<DiscoveryArgs> for LogSkeletonDiscoveryOptions {
    fn from(args: DiscoveryArgs) -> Self {
        Self {
            horizon: args.horizon,
            boundary_activities: args.boundary_activities.into_iter().collect(),
            required_activities: args.required_activities.into_iter().collect(),
            forbidden_activities: args.forbidden_activities.into_iter().collect(),
            splitters: args.splitters,
        }
    }
}

#[derive(Debug, Args)]
struct ThresholdArgs {
    /// Precedence threshold in percent
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u8).range(0..=100))]
    precedence: u8,
    /// Response threshold in percent
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u8).range(0..=100))]
    response: u8,
    /// Not co-existence threshold in percent
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u8).range(0..=100))]
    not_co_existence: u8,
    /// Equivalence threshold in percent (100 minus the noise level)
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u8).range(0..=100))]
    equivalence: u8,
}

impl From<ThresholdArgs> for QueryConfig {
    fn from(args: ThresholdArgs) -> Self {
        Self {
            precedence_threshold: args.precedence,
            response_threshold: args.response,
            not_co_existence_threshold: args.not_co_existence,
            equivalence_threshold: args.equivalence,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CheckArg {
    Cardinality,
    Causal,
    SameCount,
}

impl From<CheckArg> for CheckKind {
    fn from(arg: CheckArg) -> Self {
        match arg {
            CheckArg::Cardinality => CheckKind::Cardinality,
            CheckArg::Causal => CheckKind::CausalDependency,
            CheckArg::SameCount => CheckKind::SameCount,
        }
    }
}

fn parse_splitter(value: &str) -> Result<ActivitySplitter, String> {
    match value.split_once(ActivitySplitter::DELIMITER) {
        Some((activity, predecessor)) if !activity.is_empty() && !predecessor.is_empty() => {
            Ok(ActivitySplitter::new(activity, predecessor))
        }
        _ => Err(format!(
            "expected ACTIVITY{}PREDECESSOR, got '{value}'",
            ActivitySplitter::DELIMITER
        )),
    }
}

fn import_log(path: &Path) -> Result<EventLog> {
    let log = EventLog::import_from_path(path)
        .with_context(|| format!("Importing event log {}", path.display()))?;
    log::info!("Imported event log with {} traces", log.traces.len());
    Ok(log)
}

fn import_skeleton(path: &Path) -> Result<LogSkeleton> {
    LogSkeleton::import_from_path(path)
        .with_context(|| format!("Importing log skeleton {}", path.display()))
}

fn classifier_of(log: &EventLog, name: Option<&str>) -> Result<EventLogClassifier> {
    match name {
        None => Ok(EventLogClassifier::default()),
        Some(name) => log
            .classifier(name)
            .cloned()
            .ok_or_else(|| anyhow!("Event log has no classifier named '{name}'")),
    }
}

fn show(skeleton: &LogSkeleton, config: &QueryConfig) {
    println!("{}", skeleton.legend(config));
    println!();
    let activities = skeleton.activities();
    for a in activities {
        for b in activities {
            if skeleton.has_non_redundant_precedence(a, b, config) {
                println!("{b} always before {a}");
            }
            if skeleton.has_non_redundant_response(a, b, config) {
                println!("{b} always after {a}");
            }
            if a < b && skeleton.has_non_redundant_not_co_existence(a, b, config) {
                println!("{a} never together with {b}");
            }
        }
    }
    let noise_level = config.noise_level();
    for class in skeleton.equivalence_classes().at_noise_level(noise_level) {
        if class.len() > 1 {
            let members: Vec<&str> = class.iter().map(String::as_str).collect();
            println!("same count: {}", members.join(", "));
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    match cli.command {
        Command::Discover {
            log,
            output,
            options,
            classifier,
        } => {
            let event_log = import_log(&log)?;
            let classifier = classifier_of(&event_log, classifier.as_deref())?;
            let skeleton = discover_log_skeleton(&event_log, &classifier, &options.into());
            skeleton
                .export_to_path(&output)
                .with_context(|| format!("Writing log skeleton to {}", output.display()))?;
            log::info!("Wrote log skeleton to {}", output.display());
        }
        Command::Show {
            skeleton,
            thresholds,
        } => {
            let skeleton = import_skeleton(&skeleton)?;
            show(&skeleton, &thresholds.into());
        }
        Command::Check {
            skeleton,
            log,
            checks,
            stop_at_first_violation,
            noise_level,
            classifier,
            conforming,
            non_conforming,
        } => {
            let skeleton = import_skeleton(&skeleton)?;
            let event_log = import_log(&log)?;
            let classifier = classifier_of(&event_log, classifier.as_deref())?;
            let mut config = if checks.is_empty() {
                CheckConfig::default()
            } else {
                CheckConfig::with_checks(checks.into_iter().map(CheckKind::from))
            };
            config.stop_at_first_violation = stop_at_first_violation;
            config.noise_level = usize::from(noise_level);

            let result = classify_event_log(&event_log, &classifier, &skeleton, &config);
            for violation in result.violations.values().flatten() {
                println!("{violation}");
            }
            println!(
                "{} of {} traces conform",
                result.number_of_conforming(),
                event_log.traces.len()
            );
            for (path, sublog) in [
                (conforming, &result.conforming),
                (non_conforming, &result.non_conforming),
            ] {
                if let Some(path) = path {
                    sublog
                        .export_to_path(&path)
                        .with_context(|| format!("Writing event log to {}", path.display()))?;
                }
            }
        }
        Command::Export { skeleton, output } => {
            let skeleton = import_skeleton(&skeleton)?;
            let format = output
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default();
            if !LogSkeleton::known_export_formats()
                .iter()
                .any(|known| *known == format)
            {
                bail!("Cannot export log skeletons as '{format}'");
            }
            skeleton
                .export_to_path(&output)
                .with_context(|| format!("Writing log skeleton to {}", output.display()))?;
        }
    }
    Ok(())
}
