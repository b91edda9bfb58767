/*!
The Context Walker (C5): a deterministic, top-down descent of a single walk
target that builds the effective rule matcher fresh at every directory,
prunes excluded subdirectories, and yields included files to the File
Processor. Grounded on the `Ignore`/`IgnoreDir` push/pop stack in
`src/ignore.rs` and the `push`/`pop`-per-directory driver in `src/walk.rs`,
reimplemented as an explicit recursive function over `std::fs::read_dir`
rather than wrapping `walkdir` (see DESIGN.md).
*/

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::binary;
use crate::error::ContextError;
use crate::orchestrator::SizeLedger;
use crate::pattern::RuleLayer;
use crate::processor::{self, Emitted};
use crate::rules;
use crate::spec_compiler::{Classification, EffectiveSpec};

/// Immutable configuration shared by every directory visited during one
/// walk. Built once by the Orchestrator per walk target.
pub struct WalkCtx<'a> {
    pub project_root: &'a Path,
    pub override_layer: Option<&'a RuleLayer>,
    /// Canonical absolute paths of every caller-supplied target other than
    /// the one currently being walked; these bypass rule classification
    /// per the explicit-target exemption.
    pub explicit_targets: &'a HashSet<PathBuf>,
    pub list_only: bool,
    pub debug_explain: bool,
    pub size_limit_bytes: u64,
    /// Checked at the top of every directory visited; when set, the walk
    /// aborts with `ContextError::Cancelled`.
    pub cancel_flag: Option<&'a AtomicBool>,
}

fn is_cancelled(ctx: &WalkCtx) -> bool {
    ctx.cancel_flag.map(|f| f.load(Ordering::Relaxed)).unwrap_or(false)
}

/// Mutable state threaded through the recursion: the single SizeLedger the
/// Orchestrator owns for the duration of the call, the set of canonical
/// paths already emitted (for cross-target dedup), and the output sink.
pub struct WalkState<'a> {
    pub ledger: &'a mut SizeLedger,
    pub emitted: &'a mut HashSet<PathBuf>,
    pub output: &'a mut Vec<String>,
}

/// Convert a path's components into a forward-slash-separated string
/// regardless of host path separator conventions.
pub fn to_forward_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn canonical_or_self(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Walk `walk_target`, a directory resolved inside `ctx.project_root`.
pub fn walk(walk_target: &Path, ctx: &WalkCtx, state: &mut WalkState) -> Result<(), ContextError> {
    let mut gitignore_stack: Vec<RuleLayer> = Vec::new();
    let mut contextfile_stack: Vec<RuleLayer> = Vec::new();
    walk_dir(walk_target, walk_target, ctx, &mut gitignore_stack, &mut contextfile_stack, state)
}

/// One `.gitignore`/`.contextfiles` discovery stack per source kind, pushed
/// and popped in lockstep with the recursion so composition order is
/// `Defaults, then every .gitignore from the walk target down to the
/// current directory, then every .contextfiles from the walk target down to
/// the current directory` — not interleaved per directory, since a
/// `.contextfiles` negation at the walk target must still outrank a
/// `.gitignore` exclusion several directories below it.
fn walk_dir(
    dir: &Path,
    walk_target: &Path,
    ctx: &WalkCtx,
    gitignore_stack: &mut Vec<RuleLayer>,
    contextfile_stack: &mut Vec<RuleLayer>,
    state: &mut WalkState,
) -> Result<(), ContextError> {
    if is_cancelled(ctx) {
        return Err(ContextError::Cancelled);
    }

    let read_dir = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) => {
            log::debug!("skipping unreadable directory {}: {}", dir.display(), e);
            return Ok(());
        }
    };
    let mut entries: Vec<fs::DirEntry> = read_dir.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|e| e.file_name());

    let mut pushed_gitignore = false;
    let mut pushed_contextfile = false;
    if ctx.override_layer.is_none() {
        if let Some(layer) = rules::gitignore_layer(dir)? {
            gitignore_stack.push(layer);
            pushed_gitignore = true;
        }
        if let Some(layer) = rules::contextfile_layer(dir)? {
            contextfile_stack.push(layer);
            pushed_contextfile = true;
        }
    }

    let owned_layers;
    let spec = match ctx.override_layer {
        Some(layer) => EffectiveSpec::compile(std::slice::from_ref(layer), walk_target),
        None => {
            let mut layers = Vec::with_capacity(1 + gitignore_stack.len() + contextfile_stack.len());
            layers.push(rules::defaults_layer());
            layers.extend(gitignore_stack.iter().cloned());
            layers.extend(contextfile_stack.iter().cloned());
            owned_layers = layers;
            EffectiveSpec::compile(&owned_layers, walk_target)
        }
    };

    for entry in entries {
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(_) => continue,
        };
        if file_type.is_symlink() {
            continue;
        }

        let rel_to_target = to_forward_slash(path.strip_prefix(walk_target).unwrap_or(&path));
        let canonical = canonical_or_self(&path);
        let is_explicit = ctx.explicit_targets.contains(&canonical);

        if file_type.is_dir() {
            let dir_candidate = format!("{rel_to_target}/");
            let descend = is_explicit
                || !matches!(spec.classify(&dir_candidate, true), Classification::Excluded);
            if descend {
                walk_dir(&path, walk_target, ctx, gitignore_stack, contextfile_stack, state)?;
            }
        } else if file_type.is_file() {
            let include = is_explicit
                || !matches!(spec.classify(&rel_to_target, false), Classification::Excluded);
            if !include {
                continue;
            }
            if !state.emitted.insert(canonical) {
                continue;
            }
            if binary::is_binary(&path) {
                log::debug!("skipping binary file {}", path.display());
                continue;
            }
            let out_rel = to_forward_slash(path.strip_prefix(ctx.project_root).unwrap_or(&path));
            emit_one(&path, &out_rel, ctx, state)?;
        }
    }

    if pushed_gitignore {
        gitignore_stack.pop();
    }
    if pushed_contextfile {
        contextfile_stack.pop();
    }
    Ok(())
}

/// Run the File Processor on one file and check the aggregate size budget,
/// shared between the walker and the Orchestrator's direct handling of
/// file-targets.
pub fn emit_one(
    abs_path: &Path,
    out_rel: &str,
    ctx: &WalkCtx,
    state: &mut WalkState,
) -> Result<(), ContextError> {
    match processor::process_file(abs_path, out_rel, ctx.list_only, ctx.debug_explain, state.ledger) {
        Emitted::Block(s) => state.output.push(s),
        Emitted::Skipped => {}
    }
    let observed = state.ledger.observed_bytes();
    if observed > ctx.size_limit_bytes {
        return Err(ContextError::Oversize {
            limit_bytes: ctx.size_limit_bytes,
            observed_bytes: observed,
            largest_files: state.ledger.largest_files(),
        });
    }
    Ok(())
}
