//! YAML job files.
//!
//! ```yaml
//! scope: s3://my-bucket/hourly/2022/
//! query: SELECT s.id FROM s3object s
//! strategy: parallel
//! concurrency: 8
//! failure_policy: isolate
//! input_format:
//!   CompressionType: GZIP
//!   JSON: { Type: LINES }
//! output_format:
//!   JSON: { RecordDelimiter: "\n" }
//! hook:
//!   name: annotate
//!   args: { source: hourly }
//! ```
//!
//! Every field is optional. Job values override environment defaults and lose
//! to explicit command-line flags.

use std::fs;
use std::path::Path;

use scatterq_core::config::{EngineConfig, FailurePolicy, Scope};
use scatterq_core::error::{Error, Result};
use scatterq_core::format::{InputFormat, OutputFormat};
use scatterq_core::hook::{HookArgs, TransformHook};
use scatterq_exec::{SelectOptions, StrategyKind};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobSpec {
    pub scope: Option<String>,
    pub query: Option<String>,
    pub strategy: Option<String>,
    pub concurrency: Option<usize>,
    pub verbose: Option<bool>,
    pub failure_policy: Option<FailurePolicy>,
    pub input_format: Option<InputFormat>,
    pub output_format: Option<OutputFormat>,
    pub hook: Option<HookSpec>,
    pub aws_region: Option<String>,
    pub aws_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HookSpec {
    pub name: String,
    #[serde(default)]
    pub args: HookArgs,
}

impl HookSpec {
    pub fn build(&self) -> Result<TransformHook> {
        Ok(TransformHook::builtin(&self.name)?.with_args(self.args.clone()))
    }
}

impl JobSpec {
    pub fn parse(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::Config(format!("invalid job file: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read job file {}: {e}", path.display())))?;
        Self::parse(&text)
    }

    /// Check everything that can be checked without a remote call.
    pub fn validate(&self) -> Result<()> {
        if let Some(scope) = &self.scope {
            Scope::from_uri(scope)?;
        }
        if let Some(name) = &self.strategy {
            name.parse::<StrategyKind>()?;
        }
        if self.concurrency == Some(0) {
            return Err(Error::Config("concurrency width must be at least 1".into()));
        }
        if let Some(hook) = &self.hook {
            hook.build()?;
        }
        Ok(())
    }

    /// Overlay job values onto a config built from the environment.
    pub fn apply(&self, cfg: &mut EngineConfig) -> Result<()> {
        if let Some(scope) = &self.scope {
            cfg.scope = Scope::from_uri(scope)?;
        }
        if let Some(strategy) = &self.strategy {
            cfg.strategy = strategy.clone();
        }
        if let Some(width) = self.concurrency {
            cfg.concurrency = width;
        }
        if let Some(verbose) = self.verbose {
            cfg.verbose = verbose;
        }
        if let Some(policy) = self.failure_policy {
            cfg.failure_policy = policy;
        }
        if let Some(region) = &self.aws_region {
            cfg.aws_region = Some(region.clone());
        }
        if let Some(endpoint) = &self.aws_endpoint {
            cfg.aws_endpoint = Some(endpoint.clone());
        }
        Ok(())
    }

    /// Select options carried by the job (formats and hook).
    pub fn select_options(&self) -> Result<SelectOptions> {
        let mut options = SelectOptions::new();
        if let Some(input) = &self.input_format {
            options = options.with_input(input.clone());
        }
        if let Some(output) = &self.output_format {
            options = options.with_output(output.clone());
        }
        if let Some(hook) = &self.hook {
            options = options.with_hook(hook.build()?);
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scatterq_core::format::{CompressionType, InputSource, JsonType, OutputFormatKind};

    const JOB: &str = r#"
scope: s3://my-bucket/hourly/2022/
query: SELECT s.id FROM s3object s
strategy: sequential
concurrency: 3
failure_policy: isolate
input_format:
  CompressionType: GZIP
  JSON:
    Type: LINES
output_format:
  CSV:
    QuoteFields: ALWAYS
hook:
  name: annotate
  args:
    source: hourly
"#;

    #[test]
    fn parses_a_full_job() {
        let job = JobSpec::parse(JOB).unwrap();
        job.validate().unwrap();
        assert_eq!(job.query.as_deref(), Some("SELECT s.id FROM s3object s"));

        let input = job.input_format.clone().unwrap();
        assert_eq!(input.compression(), CompressionType::Gzip);
        assert!(matches!(input.source(), InputSource::Json(j) if j.json_type == JsonType::Lines));
        assert!(matches!(
            job.output_format.as_ref().unwrap().kind(),
            OutputFormatKind::Csv(_)
        ));

        let options = job.select_options().unwrap();
        assert_eq!(options.hook.as_ref().map(|h| h.name()), Some("annotate"));
    }

    #[test]
    fn job_values_override_environment_defaults() {
        let job = JobSpec::parse(JOB).unwrap();
        let mut cfg = EngineConfig::default();
        job.apply(&mut cfg).unwrap();
        assert_eq!(cfg.scope, Scope::new("my-bucket", "hourly/2022/"));
        assert_eq!(cfg.strategy, "sequential");
        assert_eq!(cfg.concurrency, 3);
        assert_eq!(cfg.failure_policy, FailurePolicy::Isolate);
    }

    #[test]
    fn rejects_bad_jobs() {
        assert!(JobSpec::parse("bogus_field: 1").is_err());
        assert!(JobSpec::parse("input_format:\n  CSV: {}\n  JSON: {Type: LINES}\n").is_err());

        let bad_strategy = JobSpec::parse("strategy: processes").unwrap();
        assert!(matches!(bad_strategy.validate(), Err(Error::Config(_))));

        let bad_hook = JobSpec::parse("hook:\n  name: eval\n").unwrap();
        assert!(matches!(bad_hook.validate(), Err(Error::Config(_))));

        let zero = JobSpec::parse("concurrency: 0").unwrap();
        assert!(zero.validate().is_err());
    }

    #[test]
    fn empty_job_is_valid() {
        let job = JobSpec::parse("{}").unwrap();
        job.validate().unwrap();
        let options = job.select_options().unwrap();
        assert_eq!(options.input, InputFormat::default());
    }
}
