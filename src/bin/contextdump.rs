/*!
The CLI front-end. A thin consumer of the core `read_context` API: it maps
argv onto `ReadContextOptions`, prints the resulting dump to stdout, and
renders a fatal `ContextError` to stderr with a non-zero exit code.
Argument parsing itself and everything downstream of "render this
string/error" are deliberately kept out of the core crate, the same
`main.rs`/`args.rs` split a flags-driven command-line search tool uses.
*/

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use contextdump::{ContextError, ReadContextOptions};

/// Build a consolidated text dump of a project for LLM ingestion.
#[derive(Debug, Parser)]
#[command(name = "contextdump", version, about)]
struct Args {
    /// Paths to include, relative to --root. Defaults to the whole root.
    targets: Vec<PathBuf>,

    /// Project root all targets must resolve inside of.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Replace every other rule source with these override patterns.
    /// May be given multiple times.
    #[arg(long = "override", value_name = "PATTERN")]
    overrides: Vec<String>,

    /// Print included paths only, without file contents.
    #[arg(long)]
    list_only: bool,

    /// Abort once the aggregate content size exceeds this many bytes.
    #[arg(long)]
    max_bytes: Option<u64>,

    /// Emit a note for every file skipped due to a read/decode failure.
    #[arg(long)]
    debug_explain: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let mut options = ReadContextOptions::new(args.root)
        .targets(args.targets)
        .override_rules(args.overrides)
        .list_only(args.list_only)
        .debug_explain(args.debug_explain);
    if let Some(limit) = args.max_bytes {
        options = options.size_limit_bytes(limit);
    }

    match contextdump::read_context(options) {
        Ok(dump) => {
            print!("{dump}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            render_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn render_error(err: &ContextError) {
    eprintln!("contextdump: {err}");
    if let ContextError::Oversize { limit_bytes, observed_bytes, largest_files } = err {
        eprintln!();
        eprintln!("limit:    {limit_bytes} bytes");
        eprintln!("observed: {observed_bytes} bytes");
        eprintln!("largest files:");
        for f in largest_files {
            eprintln!("  {:>10}  {}", f.size_bytes, f.rel_path);
        }
    }
}
