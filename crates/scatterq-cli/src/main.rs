//! scatterq CLI: estimate, run, and validate fan-out queries.

mod job;

use std::error::Error as StdError;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use scatterq_core::config::{EngineConfig, FailurePolicy, Scope};
use scatterq_core::hook::TransformHook;
use scatterq_exec::{SelectOptions, Session};
use scatterq_io::Connector;
use serde_json::Value;
use tracing_subscriber::fmt;

use crate::job::JobSpec;

type CliResult<T> = Result<T, Box<dyn StdError>>;

#[derive(Parser)]
#[command(name = "scatterq")]
#[command(about = "Run one S3 Select query over every object under a prefix", long_about = None)]
struct Cli {
    /// Log level (logs go to stderr)
    #[arg(long, value_enum, global = true, default_value = "warn")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the worst-case cost of querying every object under the scope
    Estimate {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Run a query over the scope and print the aggregate result as JSON
    Select {
        #[command(flatten)]
        common: CommonArgs,

        /// SQL expression (overrides the job file)
        #[arg(short, long)]
        query: Option<String>,

        /// Strategy name: sequential or parallel
        #[arg(long)]
        strategy: Option<String>,

        /// Worker pool width
        #[arg(long, value_parser = parse_positive_usize)]
        concurrency: Option<usize>,

        /// Built-in transform hook: identity, trim, annotate
        #[arg(long)]
        hook: Option<String>,

        /// Hook argument as key=value (value parsed as JSON when possible)
        #[arg(long = "hook-arg", value_parser = parse_hook_arg)]
        hook_args: Vec<(String, Value)>,

        /// Record failing objects and keep going instead of aborting
        #[arg(long)]
        isolate_failures: bool,

        /// Log per-object progress at info level
        #[arg(short, long)]
        verbose: bool,

        /// Pretty-print the JSON result
        #[arg(long)]
        pretty: bool,
    },

    /// Check a job file without touching the network
    Validate {
        /// Path to the job YAML file
        #[arg(short, long)]
        job: PathBuf,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct CommonArgs {
    /// Scope URI, e.g. s3://bucket/prefix
    #[arg(long)]
    scope: Option<String>,

    /// Job file (YAML)
    #[arg(short, long)]
    job: Option<PathBuf>,

    /// AWS region
    #[arg(long)]
    aws_region: Option<String>,

    /// Custom endpoint (LocalStack, MinIO)
    #[arg(long)]
    aws_endpoint: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

fn init_logging(level: LogLevel) {
    let level: tracing::Level = level.into();
    fmt::Subscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let level = match &cli.command {
        Commands::Select { verbose: true, .. } => match cli.log_level {
            LogLevel::Warn | LogLevel::Error => LogLevel::Info,
            other => other,
        },
        _ => cli.log_level,
    };
    init_logging(level);

    let outcome = match cli.command {
        Commands::Estimate { common } => run_estimate(&common),
        Commands::Select {
            common,
            query,
            strategy,
            concurrency,
            hook,
            hook_args,
            isolate_failures,
            verbose,
            pretty,
        } => {
            let overrides = SelectOverrides {
                query,
                strategy,
                concurrency,
                hook,
                hook_args,
                isolate_failures,
                verbose,
            };
            run_select(&common, overrides, pretty)
        }
        Commands::Validate { job } => validate_job(&job).map(|()| println!("✓ Job is valid")),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Select flags that override the environment and the job file.
#[derive(Debug, Default)]
struct SelectOverrides {
    query: Option<String>,
    strategy: Option<String>,
    concurrency: Option<usize>,
    hook: Option<String>,
    hook_args: Vec<(String, Value)>,
    isolate_failures: bool,
    verbose: bool,
}

fn load_job(common: &CommonArgs) -> CliResult<JobSpec> {
    match &common.job {
        Some(path) => Ok(JobSpec::load(path)?),
        None => Ok(JobSpec::default()),
    }
}

/// Environment, then job file, then flags.
fn resolve_config(common: &CommonArgs, job: &JobSpec) -> CliResult<EngineConfig> {
    let mut config = EngineConfig::from_env();
    job.apply(&mut config)?;
    if let Some(scope) = &common.scope {
        config.scope = Scope::from_uri(scope)?;
    }
    if let Some(region) = &common.aws_region {
        config.aws_region = Some(region.clone());
    }
    if let Some(endpoint) = &common.aws_endpoint {
        config.aws_endpoint = Some(endpoint.clone());
    }
    if config.scope.bucket.is_empty() {
        return Err("no scope given; pass --scope, set SCATTERQ_SCOPE, or add `scope` to the job".into());
    }
    Ok(config)
}

fn apply_select_overrides(
    config: &mut EngineConfig,
    options: SelectOptions,
    overrides: SelectOverrides,
) -> CliResult<SelectOptions> {
    let mut options = options;
    if let Some(strategy) = overrides.strategy {
        config.strategy = strategy;
    }
    if let Some(width) = overrides.concurrency {
        config.concurrency = width;
    }
    if overrides.isolate_failures {
        config.failure_policy = FailurePolicy::Isolate;
    }
    if overrides.verbose {
        config.verbose = true;
    }
    if let Some(name) = overrides.hook {
        let mut hook = TransformHook::builtin(&name)?;
        for (key, value) in overrides.hook_args {
            hook = hook.with_arg(key, value);
        }
        options = options.with_hook(hook);
    } else if !overrides.hook_args.is_empty() {
        let hook = options
            .hook
            .take()
            .ok_or("--hook-arg given without --hook or a job hook")?;
        let hook = overrides
            .hook_args
            .into_iter()
            .fold(hook, |hook, (key, value)| hook.with_arg(key, value));
        options = options.with_hook(hook);
    }
    Ok(options)
}

#[cfg(feature = "s3")]
fn connector(config: &EngineConfig) -> CliResult<Arc<dyn Connector>> {
    Ok(Arc::new(scatterq_io::S3Connector::new(
        &config.connection_config(),
    )))
}

#[cfg(not(feature = "s3"))]
fn connector(_config: &EngineConfig) -> CliResult<Arc<dyn Connector>> {
    Err("scatterq was built without the `s3` feature; rebuild with `--features scatterq-cli/s3`".into())
}

fn run_estimate(common: &CommonArgs) -> CliResult<()> {
    let job = load_job(common)?;
    let config = resolve_config(common, &job)?;
    let session = Session::new(connector(&config)?, config);
    let cost = session.estimate_cost()?;
    println!("{cost}");
    Ok(())
}

fn run_select(common: &CommonArgs, overrides: SelectOverrides, pretty: bool) -> CliResult<()> {
    let job = load_job(common)?;
    let mut config = resolve_config(common, &job)?;
    let query = overrides
        .query
        .clone()
        .or_else(|| job.query.clone())
        .ok_or("no query given; pass --query or add `query` to the job")?;
    let options = apply_select_overrides(&mut config, job.select_options()?, overrides)?;

    let session = Session::new(connector(&config)?, config);
    let result = session.select(&query, options)?;
    let json = if pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{json}");
    Ok(())
}

fn validate_job(path: &Path) -> CliResult<()> {
    let job = JobSpec::load(path)?;
    job.validate()?;
    Ok(())
}

/// Parse a positive usize (>= 1).
fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value == 0 {
        return Err("value must be at least 1".to_string());
    }
    Ok(value)
}

fn parse_hook_arg(s: &str) -> Result<(String, Value), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("'{s}' is not key=value"))?;
    if key.is_empty() {
        return Err(format!("'{s}' has an empty key"));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_select_flags() {
        let cli = Cli::try_parse_from([
            "scatterq",
            "select",
            "--scope",
            "s3://b/p",
            "--query",
            "SELECT 1",
            "--concurrency",
            "4",
            "--hook",
            "annotate",
            "--hook-arg",
            "n=3",
            "--hook-arg",
            "source=hourly",
            "--isolate-failures",
        ])
        .unwrap();
        match cli.command {
            Commands::Select {
                common,
                concurrency,
                hook_args,
                isolate_failures,
                ..
            } => {
                assert_eq!(common.scope.as_deref(), Some("s3://b/p"));
                assert_eq!(concurrency, Some(4));
                assert_eq!(hook_args[0], ("n".to_string(), Value::from(3)));
                assert_eq!(hook_args[1], ("source".to_string(), Value::from("hourly")));
                assert!(isolate_failures);
            }
            _ => panic!("expected select"),
        }
    }

    #[test]
    fn zero_concurrency_is_rejected_by_the_parser() {
        let err = Cli::try_parse_from([
            "scatterq",
            "select",
            "--query",
            "q",
            "--concurrency",
            "0",
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn flags_override_job_values() {
        let job = JobSpec::parse("scope: s3://job-bucket/a\nstrategy: sequential\nconcurrency: 2\n")
            .unwrap();
        let common = CommonArgs {
            scope: Some("s3://flag-bucket/b".into()),
            ..Default::default()
        };
        let mut config = resolve_config(&common, &job).unwrap();
        assert_eq!(config.scope, Scope::new("flag-bucket", "b"));
        assert_eq!(config.strategy, "sequential");

        let overrides = SelectOverrides {
            strategy: Some("parallel".into()),
            concurrency: Some(9),
            isolate_failures: true,
            ..Default::default()
        };
        apply_select_overrides(&mut config, SelectOptions::new(), overrides).unwrap();
        assert_eq!(config.strategy, "parallel");
        assert_eq!(config.concurrency, 9);
        assert_eq!(config.failure_policy, FailurePolicy::Isolate);
    }

    #[test]
    fn hook_args_extend_the_job_hook() {
        let job = JobSpec::parse("hook:\n  name: annotate\n  args: {a: 1}\n").unwrap();
        let mut config = EngineConfig::default();
        let overrides = SelectOverrides {
            hook_args: vec![("b".into(), Value::from(2))],
            ..Default::default()
        };
        let options =
            apply_select_overrides(&mut config, job.select_options().unwrap(), overrides).unwrap();
        let hook = options.hook.unwrap();
        assert_eq!(hook.args().len(), 2);

        let stray = SelectOverrides {
            hook_args: vec![("b".into(), Value::from(2))],
            ..Default::default()
        };
        assert!(apply_select_overrides(&mut config, SelectOptions::new(), stray).is_err());
    }

    #[test]
    fn unknown_hook_flag_is_an_error() {
        let mut config = EngineConfig::default();
        let overrides = SelectOverrides {
            hook: Some("eval".into()),
            ..Default::default()
        };
        assert!(apply_select_overrides(&mut config, SelectOptions::new(), overrides).is_err());
    }

    #[test]
    fn hook_arg_parser() {
        assert_eq!(
            parse_hook_arg("flag=true").unwrap(),
            ("flag".to_string(), Value::Bool(true))
        );
        assert_eq!(
            parse_hook_arg("path=a=b").unwrap(),
            ("path".to_string(), Value::from("a=b"))
        );
        assert!(parse_hook_arg("novalue").is_err());
        assert!(parse_hook_arg("=x").is_err());
    }
}
