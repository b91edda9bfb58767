/*!
The error module defines the taxonomy of fatal conditions the core engine
can raise. Every variant is a tagged kind, never a bare string, so that a
front-end can render `DetailedContextSizeError`'s payload (the limit, the
observed total, and the largest files) in its own vocabulary instead of
just echoing a message.
*/

use std::io;
use std::path::PathBuf;

/// One of the largest files seen while accumulating the `SizeLedger`,
/// reported as part of a `ContextError::Oversize` diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LargestFile {
    /// Path relative to the project root, forward-slash separated.
    pub rel_path: String,
    /// Raw size of the file in bytes.
    pub size_bytes: u64,
}

/// The complete set of fatal error kinds the core engine can produce.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("project root {path} does not exist or is not a directory")]
    InvalidRoot { path: PathBuf },

    #[error("target {path} resolves outside of project root {root}")]
    TargetOutsideRoot { path: PathBuf, root: PathBuf },

    #[error("could not read rule file {path}: {source}")]
    RuleRead {
        path: PathBuf,
        #[source]
        source: RuleReadCause,
    },

    #[error(
        "aggregate content size {observed_bytes} bytes exceeds the limit of \
         {limit_bytes} bytes"
    )]
    Oversize {
        limit_bytes: u64,
        observed_bytes: u64,
        largest_files: Vec<LargestFile>,
    },

    #[error("walk cancelled")]
    Cancelled,
}

/// Why an explicitly named rule file could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum RuleReadCause {
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("not valid UTF-8")]
    Utf8,
}

pub type Result<T> = std::result::Result<T, ContextError>;
