//! Per-chunk transform hooks.
//!
//! A hook is a plain function pointer plus a flat argument map. Both are
//! `Send + Sync + Clone` without capturing caller state, so a hook can be handed
//! to any worker. The hook sees the decoded payload only; [`TransformHook::apply`]
//! swaps the payload of a [`ChunkResult`] and cannot reach its statistics.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::error::{Error, HookError, Result};
use crate::types::ChunkResult;

/// Named hook arguments.
pub type HookArgs = BTreeMap<String, Value>;

/// Signature every hook implements.
pub type HookFn = fn(&str, &HookArgs) -> std::result::Result<String, HookError>;

#[derive(Clone)]
pub struct TransformHook {
    name: String,
    func: HookFn,
    args: HookArgs,
}

impl TransformHook {
    pub fn new(name: impl Into<String>, func: HookFn) -> Self {
        Self {
            name: name.into(),
            func,
            args: HookArgs::new(),
        }
    }

    /// Look up one of the built-in hooks by name.
    pub fn builtin(name: &str) -> Result<Self> {
        let func = builtin(name).ok_or_else(|| {
            Error::Config(format!(
                "unknown hook '{name}'; built-ins are {:?}",
                BUILTIN_NAMES
            ))
        })?;
        Ok(Self::new(name, func))
    }

    pub fn with_args(mut self, args: HookArgs) -> Self {
        self.args = args;
        self
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &HookArgs {
        &self.args
    }

    /// Run the hook over one chunk's payload.
    pub fn apply(&self, chunk: ChunkResult) -> std::result::Result<ChunkResult, HookError> {
        let payload = (self.func)(chunk.payload(), &self.args)?;
        Ok(chunk.with_payload(payload))
    }
}

impl fmt::Debug for TransformHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformHook")
            .field("name", &self.name)
            .field("args", &self.args)
            .finish()
    }
}

// --- built-ins ---

pub const BUILTIN_NAMES: [&str; 3] = ["identity", "trim", "annotate"];

pub fn builtin(name: &str) -> Option<HookFn> {
    match name {
        "identity" => Some(identity as HookFn),
        "trim" => Some(trim as HookFn),
        "annotate" => Some(annotate as HookFn),
        _ => None,
    }
}

fn identity(payload: &str, _args: &HookArgs) -> std::result::Result<String, HookError> {
    Ok(payload.to_string())
}

fn trim(payload: &str, _args: &HookArgs) -> std::result::Result<String, HookError> {
    Ok(payload.trim().to_string())
}

/// Parse each non-empty line as a JSON object and add every argument as a field.
fn annotate(payload: &str, args: &HookArgs) -> std::result::Result<String, HookError> {
    let mut out = String::with_capacity(payload.len());
    for (lineno, line) in payload.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut record: Value = serde_json::from_str(line)
            .map_err(|e| HookError::new(format!("line {}: {e}", lineno + 1)))?;
        let obj = record.as_object_mut().ok_or_else(|| {
            HookError::new(format!("line {}: record is not a JSON object", lineno + 1))
        })?;
        for (k, v) in args {
            obj.insert(k.clone(), v.clone());
        }
        out.push_str(&record.to_string());
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScanStats;

    fn shout(payload: &str, args: &HookArgs) -> std::result::Result<String, HookError> {
        let suffix = args.get("suffix").and_then(|v| v.as_str()).unwrap_or("");
        Ok(format!("{}{}", payload.to_uppercase(), suffix))
    }

    #[test]
    fn hook_rewrites_payload_only() {
        let stats = ScanStats::new(30, 30, 10);
        let hook = TransformHook::new("shout", shout).with_arg("suffix", "!");
        let out = hook.apply(ChunkResult::new("test", stats)).unwrap();
        assert_eq!(out.payload(), "TEST!");
        assert_eq!(out.stats(), stats);
    }

    #[test]
    fn annotate_adds_arguments_to_each_record() {
        let hook = TransformHook::builtin("annotate")
            .unwrap()
            .with_arg("message", "hello")
            .with_arg("run", 7);
        let out = hook
            .apply(ChunkResult::new(
                "{\"file\":1}\n{\"file\":2}\n",
                ScanStats::default(),
            ))
            .unwrap();
        let lines: Vec<Value> = out
            .payload()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["file"], 2);
        assert_eq!(lines[0]["message"], "hello");
        assert_eq!(lines[1]["run"], 7);
    }

    #[test]
    fn annotate_rejects_non_objects() {
        let hook = TransformHook::builtin("annotate").unwrap();
        let err = hook
            .apply(ChunkResult::new("[1,2]", ScanStats::default()))
            .unwrap_err();
        assert!(err.to_string().contains("not a JSON object"));
    }

    #[test]
    fn unknown_builtin_is_config_error() {
        let err = TransformHook::builtin("eval").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn hooks_cross_threads() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<TransformHook>();
    }
}
