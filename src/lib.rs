/*!
contextdump builds a single consolidated textual "context dump" of a source
project for feeding into a large language model. It walks one or more
target paths rooted in a project directory, filters each discovered file
through a layered, gitignore-style rule engine, rejects binary files and
oversized aggregates, and emits a deterministic stream of per-file blocks
with relative-path headers.

The core of this crate is the hierarchical path-filtering and traversal
engine: [`orchestrator::read_context`] composes, at every directory
visited, an ordered rule set from built-in defaults, any discovered
`.gitignore`/`.contextfiles`, and caller-supplied override rules; compiles
that rule set into a matcher ([`spec_compiler::EffectiveSpec`]); and
cooperates with binary detection ([`binary`]) and an aggregate size budget
([`orchestrator::SizeLedger`]) that, when exceeded, produces a structured
diagnostic naming the largest contributing files.
*/

pub mod binary;
pub mod error;
pub mod glob;
pub mod orchestrator;
pub mod pattern;
pub mod processor;
pub mod rules;
pub mod spec_compiler;
pub mod walker;

pub use error::{ContextError, LargestFile};
pub use orchestrator::{read_context, ReadContextOptions, SizeLedger, DEFAULT_SIZE_LIMIT_BYTES, SIZE_LIMIT_ENV_VAR};
