/*!
The Orchestrator (C6): validates inputs, computes one walk target per
caller-supplied target, drives the Context Walker, and enforces the
aggregate size budget. Follows the validate-then-dispatch shape of a
flags-parse/path-resolve/dispatch front-end, with a `ReadContextOptions`
builder in the same incremental-construction idiom as this codebase's
other builders.
*/

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{ContextError, LargestFile};
use crate::rules;
use crate::walker::{self, WalkCtx, WalkState};

/// Default aggregate size budget (100 MiB) used when neither the caller nor
/// the `CONTEXTDUMP_MAX_BYTES` environment variable overrides it.
pub const DEFAULT_SIZE_LIMIT_BYTES: u64 = 100 * 1024 * 1024;

/// The environment variable consumed by the core to override the default
/// size limit, per the "Environment inputs" contract.
pub const SIZE_LIMIT_ENV_VAR: &str = "CONTEXTDUMP_MAX_BYTES";

/// A running aggregate of bytes emitted as content, plus a bounded top-10
/// largest-files tracker used for the oversize diagnostic. Owned
/// exclusively by the Orchestrator for the duration of one `read_context`
/// call and threaded by mutable reference through the walker.
pub struct SizeLedger {
    observed_bytes: u64,
    largest: Vec<LargestFile>,
}

const LARGEST_FILES_TRACKED: usize = 10;

impl SizeLedger {
    pub fn new() -> SizeLedger {
        SizeLedger { observed_bytes: 0, largest: Vec::with_capacity(LARGEST_FILES_TRACKED + 1) }
    }

    /// Record one processed file. `raw_size` always feeds the largest-files
    /// tracker; it only counts toward `observed_bytes` when `list_only` is
    /// false, matching the File Processor's accounting rule.
    pub fn record(&mut self, rel_path: &str, raw_size: u64, list_only: bool) {
        if !list_only {
            self.observed_bytes += raw_size;
        }
        self.largest.push(LargestFile { rel_path: rel_path.to_string(), size_bytes: raw_size });
        self.largest.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes).then_with(|| a.rel_path.cmp(&b.rel_path)));
        self.largest.truncate(LARGEST_FILES_TRACKED);
    }

    pub fn observed_bytes(&self) -> u64 {
        self.observed_bytes
    }

    pub fn largest_files(&self) -> Vec<LargestFile> {
        self.largest.clone()
    }
}

impl Default for SizeLedger {
    fn default() -> Self {
        SizeLedger::new()
    }
}

/// Inputs to `read_context`, built incrementally rather than passed as one
/// long positional parameter list, for assembling an operation with several
/// optional knobs.
#[derive(Debug)]
pub struct ReadContextOptions {
    project_root: PathBuf,
    targets: Vec<PathBuf>,
    override_rules: Vec<String>,
    list_only: bool,
    size_limit_bytes: Option<u64>,
    debug_explain: bool,
    cancel_flag: Option<Arc<AtomicBool>>,
}

impl ReadContextOptions {
    pub fn new(project_root: impl Into<PathBuf>) -> ReadContextOptions {
        ReadContextOptions {
            project_root: project_root.into(),
            targets: Vec::new(),
            override_rules: Vec::new(),
            list_only: false,
            size_limit_bytes: None,
            debug_explain: false,
            cancel_flag: None,
        }
    }

    pub fn target(mut self, target: impl Into<PathBuf>) -> Self {
        self.targets.push(target.into());
        self
    }

    pub fn targets(mut self, targets: impl IntoIterator<Item = PathBuf>) -> Self {
        self.targets.extend(targets);
        self
    }

    pub fn override_rules(mut self, rules: impl IntoIterator<Item = String>) -> Self {
        self.override_rules.extend(rules);
        self
    }

    pub fn list_only(mut self, yes: bool) -> Self {
        self.list_only = yes;
        self
    }

    pub fn size_limit_bytes(mut self, limit: u64) -> Self {
        self.size_limit_bytes = Some(limit);
        self
    }

    pub fn debug_explain(mut self, yes: bool) -> Self {
        self.debug_explain = yes;
        self
    }

    /// Share a flag the caller can set from another thread to abort the
    /// walk early with `ContextError::Cancelled`, checked at every
    /// directory entry.
    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = Some(flag);
        self
    }
}

fn is_cancelled(ctx: &WalkCtx) -> bool {
    ctx.cancel_flag.map(|f| f.load(Ordering::Relaxed)).unwrap_or(false)
}

fn resolve_size_limit(options: &ReadContextOptions) -> u64 {
    if let Some(limit) = options.size_limit_bytes {
        return limit;
    }
    if let Ok(raw) = std::env::var(SIZE_LIMIT_ENV_VAR) {
        if let Ok(parsed) = raw.parse::<u64>() {
            return parsed;
        }
        log::warn!("ignoring non-numeric {SIZE_LIMIT_ENV_VAR}={raw:?}");
    }
    DEFAULT_SIZE_LIMIT_BYTES
}

/// Resolve `path` against `project_root` and fail with `TargetOutsideRoot`
/// if the canonical result does not live under it.
fn resolve_target(project_root: &Path, path: &Path) -> Result<PathBuf, ContextError> {
    let joined = if path.is_absolute() { path.to_path_buf() } else { project_root.join(path) };
    let canonical = joined.canonicalize().unwrap_or(joined);
    if !canonical.starts_with(project_root) {
        return Err(ContextError::TargetOutsideRoot { path: canonical, root: project_root.to_path_buf() });
    }
    Ok(canonical)
}

/// The core operation: walk `options.targets` (or the whole project root if
/// none are given), apply the layered rule engine, and return the
/// concatenated text dump.
pub fn read_context(options: ReadContextOptions) -> Result<String, ContextError> {
    let project_root = options
        .project_root
        .canonicalize()
        .map_err(|_| ContextError::InvalidRoot { path: options.project_root.clone() })?;
    if !project_root.is_dir() {
        return Err(ContextError::InvalidRoot { path: project_root });
    }

    let raw_targets = if options.targets.is_empty() {
        vec![project_root.clone()]
    } else {
        options
            .targets
            .iter()
            .map(|t| resolve_target(&project_root, t))
            .collect::<Result<Vec<_>, _>>()?
    };

    let mut file_targets = Vec::new();
    let mut dir_targets = Vec::new();
    for target in &raw_targets {
        if target.is_dir() {
            dir_targets.push(target.clone());
        } else {
            file_targets.push(target.clone());
        }
    }

    let explicit_targets: HashSet<PathBuf> = raw_targets.iter().cloned().collect();

    let override_layer = if options.override_rules.is_empty() {
        None
    } else {
        Some(rules::override_layer(&options.override_rules)?)
    };

    let size_limit_bytes = resolve_size_limit(&options);

    let mut ledger = SizeLedger::new();
    let mut emitted: HashSet<PathBuf> = HashSet::new();
    let mut output: Vec<String> = Vec::new();

    let ctx = WalkCtx {
        project_root: &project_root,
        override_layer: override_layer.as_ref(),
        explicit_targets: &explicit_targets,
        list_only: options.list_only,
        debug_explain: options.debug_explain,
        size_limit_bytes,
        cancel_flag: options.cancel_flag.as_deref(),
    };
    let mut state = WalkState { ledger: &mut ledger, emitted: &mut emitted, output: &mut output };

    for file_target in &file_targets {
        if is_cancelled(&ctx) {
            return Err(ContextError::Cancelled);
        }
        if !state.emitted.insert(file_target.clone()) {
            continue;
        }
        if crate::binary::is_binary(file_target) {
            log::debug!("skipping binary target {}", file_target.display());
            continue;
        }
        let out_rel = walker::to_forward_slash(file_target.strip_prefix(&project_root).unwrap_or(file_target));
        walker::emit_one(file_target, &out_rel, &ctx, &mut state)?;
    }

    for dir_target in &dir_targets {
        if is_cancelled(&ctx) {
            return Err(ContextError::Cancelled);
        }
        walker::walk(dir_target, &ctx, &mut state)?;
    }

    Ok(render(&output, options.list_only))
}

fn render(output: &[String], list_only: bool) -> String {
    if list_only {
        let mut s = output.join("\n");
        if !output.is_empty() {
            s.push('\n');
        }
        s
    } else {
        output.join("\n\n")
    }
}
