/*!
The Rule Loader (C1): turns a rule file or an in-memory pattern list into an
ordered list of raw pattern strings, with comments and blank lines dropped.
Grounded on `GitignoreBuilder::add_path`/`add_str` in `src/gitignore.rs`,
which does the same line-stripping before handing each line to its pattern
parser.
*/

use std::fs;
use std::path::Path;

use crate::error::{ContextError, RuleReadCause};
use crate::pattern::{Pattern, RuleLayer, RuleSource};

/// The fixed built-in exclusion list. Reproduced verbatim; do not add,
/// remove, or reorder entries without updating the scenarios that pin
/// this list's behavior.
pub const DEFAULT_PATTERNS: &[&str] = &[
    ".*",
    ".git/",
    ".hg/",
    ".svn/",
    ".idea/",
    ".vscode/",
    "node_modules/",
    "venv/",
    ".venv/",
    "__pycache__/",
    "dist/",
    "build/",
    "target/",
    "out/",
    "bin/",
    "obj/",
    "*.egg-info/",
    "*.log",
    "log.*",
    "*.bak",
    "*.tmp",
    "*.temp",
    "*.swp",
    "*~",
];

/// Strip comment lines (`#...`) and blank/whitespace-only lines from raw
/// rule-file text, preserving interior whitespace of surviving lines.
fn strip_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .filter(|l| !l.trim_start().starts_with('#'))
        .map(|l| l.to_string())
        .collect()
}

/// Load raw pattern lines from an in-memory list (comments/blanks already
/// assumed absent, but stripped again defensively since override rules may
/// arrive from a file on the CLI side too).
pub fn load_strs(lines: &[String]) -> Vec<String> {
    strip_lines(&lines.join("\n"))
}

/// Load raw pattern lines from a named rule file such as an override file
/// passed explicitly on the command line. Unlike `.gitignore`/`.contextfiles`
/// discovered during a walk, a missing or undecodable file here is fatal.
pub fn load_file(path: &Path) -> Result<Vec<String>, ContextError> {
    let bytes = fs::read(path).map_err(|e| ContextError::RuleRead {
        path: path.to_path_buf(),
        source: RuleReadCause::Io(e),
    })?;
    let text = String::from_utf8(bytes).map_err(|_| ContextError::RuleRead {
        path: path.to_path_buf(),
        source: RuleReadCause::Utf8,
    })?;
    Ok(strip_lines(&text))
}

/// Load a `.gitignore` or `.contextfiles` discovered at `dir` during a walk.
/// A missing file silently contributes zero patterns; an undecodable one
/// is logged and treated the same way, since these are never fatal per the
/// Rule Loader's error contract.
fn load_discovered(dir: &Path, filename: &str) -> Vec<String> {
    let path = dir.join(filename);
    match fs::read(&path) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => strip_lines(&text),
            Err(_) => {
                log::warn!("{} is not valid UTF-8; ignoring", path.display());
                vec![]
            }
        },
        Err(_) => vec![],
    }
}

fn compile_layer(source: RuleSource, lines: Vec<String>) -> Result<RuleLayer, ContextError> {
    let mut patterns = Vec::with_capacity(lines.len());
    for line in lines {
        match Pattern::parse(&line) {
            Ok(p) => patterns.push(p),
            Err(e) => {
                // A malformed line in a discovered or override file is not
                // one of the fatal Rule Loader conditions (those are only
                // "file unreadable"/"not UTF-8"); skip the offending line
                // and keep going, same as a gitignore parser silently
                // ignoring a pattern it can't compile.
                log::warn!("skipping unparseable pattern {:?}: {}", line, e);
            }
        }
    }
    Ok(RuleLayer::new(source, patterns))
}

/// Build the `Defaults` layer from the fixed built-in list.
pub fn defaults_layer() -> RuleLayer {
    compile_layer(
        RuleSource::Defaults,
        DEFAULT_PATTERNS.iter().map(|s| s.to_string()).collect(),
    )
    .expect("built-in default patterns must always compile")
}

/// Discover and compile a `.gitignore` at `dir`, if present.
pub fn gitignore_layer(dir: &Path) -> Result<Option<RuleLayer>, ContextError> {
    let lines = load_discovered(dir, ".gitignore");
    if lines.is_empty() {
        return Ok(None);
    }
    Ok(Some(compile_layer(RuleSource::Gitignore(dir.to_path_buf()), lines)?))
}

/// Discover and compile a `.contextfiles` at `dir`, if present.
pub fn contextfile_layer(dir: &Path) -> Result<Option<RuleLayer>, ContextError> {
    let lines = load_discovered(dir, ".contextfiles");
    if lines.is_empty() {
        return Ok(None);
    }
    Ok(Some(compile_layer(RuleSource::Contextfile(dir.to_path_buf()), lines)?))
}

/// Build the single `Override` layer from caller-supplied pattern strings.
pub fn override_layer(patterns: &[String]) -> Result<RuleLayer, ContextError> {
    compile_layer(RuleSource::Override, load_strs(patterns))
}
