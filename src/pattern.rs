/*!
Pattern parsing: turns a single raw line from a rule source into a `Pattern`
carrying the anchored/negated/dir-only flags gitignore semantics need, plus
the compiled regex fragment the rule compiler assembles into a `GlobSet`.
*/

use std::path::PathBuf;

use crate::glob::Glob;

/// Where a `RuleLayer` came from. Carries the anchor directory for sources
/// that have one, since non-anchored patterns within that source are
/// resolved relative to it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RuleSource {
    /// The fixed built-in exclusion list; see `rules::DEFAULT_PATTERNS`.
    Defaults,
    /// A `.gitignore` discovered at the given directory.
    Gitignore(PathBuf),
    /// A `.contextfiles` discovered at the given directory.
    Contextfile(PathBuf),
    /// Caller-supplied patterns that replace every other source.
    Override,
}

impl RuleSource {
    /// The directory non-anchored patterns from this source resolve
    /// relative to, or `None` for a source with no directory of its own.
    pub fn anchor(&self) -> Option<&std::path::Path> {
        match self {
            RuleSource::Gitignore(dir) | RuleSource::Contextfile(dir) => Some(dir.as_path()),
            RuleSource::Defaults | RuleSource::Override => None,
        }
    }
}

/// A single parsed line from a rule file or an in-memory pattern list.
#[derive(Clone, Debug)]
pub struct Pattern {
    /// The line as originally written, for diagnostics and round-tripping.
    pub original: String,
    /// True if the pattern began with `!`.
    pub negated: bool,
    /// True if the pattern began with `/` (anchored to its layer's anchor
    /// directory rather than matchable at any depth below it).
    pub anchored: bool,
    /// True if the pattern ended with `/` (only matches directories).
    pub dir_only: bool,
    /// The compiled glob, stripped of its `!` and anchoring/dir-only
    /// markers, ready to be turned into a regex fragment.
    glob: Glob,
}

/// An error produced while parsing a single pattern line.
#[derive(Debug, thiserror::Error)]
#[error("invalid pattern {original:?}: {source}")]
pub struct PatternError {
    pub original: String,
    #[source]
    pub source: crate::glob::GlobError,
}

impl Pattern {
    /// Parse one non-blank, non-comment rule-file line.
    pub fn parse(line: &str) -> Result<Pattern, PatternError> {
        let original = line.to_string();
        // Owned rather than a borrow of `line`: restoring an escaped `!`/`#`
        // prepends a character that isn't present at any byte offset of the
        // original line, so a plain subslice can't express it.
        let mut s = line.to_string();

        let negated = if let Some(rest) = s.strip_prefix('!') {
            s = rest.to_string();
            true
        } else if let Some(rest) = s.strip_prefix("\\!") {
            // The backslash escapes the '!' from being read as negation;
            // the '!' itself stays part of the matched text.
            s = format!("!{rest}");
            false
        } else {
            false
        };

        if let Some(rest) = s.strip_prefix("\\#") {
            s = format!("#{rest}");
        }

        let anchored = s.starts_with('/');
        if anchored {
            s = s[1..].to_string();
        }

        // A trailing '/' marks a directory-only pattern; strip it before
        // compiling the glob, but a single trailing '/' does not, by
        // itself, force literal separator matching the way an embedded
        // '/' does.
        let dir_only = s.len() > 1 && s.ends_with('/');
        let body = if dir_only { &s[..s.len() - 1] } else { s.as_str() };

        // gitignore treats any pattern containing a '/' other than a
        // trailing one as anchored-at-any-depth-but-path-shaped: '*' must
        // not cross a '/' in it. A pattern with no inner '/' may match at
        // any single path component.
        let has_inner_slash = body.trim_end_matches('/').contains('/');
        let effective = if anchored || has_inner_slash {
            body.to_string()
        } else {
            format!("**/{body}")
        };

        let glob = Glob::parse(&effective).map_err(|source| PatternError {
            original: original.clone(),
            source,
        })?;

        Ok(Pattern { original, negated, anchored, dir_only, glob })
    }

    /// Render this pattern's regex fragment. `*`/`?` never cross a `/`,
    /// matching gitignore's wildmatch rules regardless of anchoring.
    pub fn to_regex(&self) -> String {
        self.glob.to_regex(true)
    }
}

/// An ordered sequence of `Pattern`s drawn from one `RuleSource`.
#[derive(Clone, Debug)]
pub struct RuleLayer {
    pub source: RuleSource,
    pub patterns: Vec<Pattern>,
}

impl RuleLayer {
    pub fn new(source: RuleSource, patterns: Vec<Pattern>) -> RuleLayer {
        RuleLayer { source, patterns }
    }
}
