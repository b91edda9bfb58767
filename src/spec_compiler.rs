/*!
The rule compiler (C2): turns an ordered list of `RuleLayer`s into an
`EffectiveSpec` that can classify a relative path as included, excluded, or
unmatched. Grounded on `Ignore::ignored`, which scans its stack of
per-directory `Gitignore`s from the innermost outward, each matched
against the candidate relative to *that Gitignore's own root*
(`Gitignore::matched` strips its own `self.root` prefix before delegating
to the compiled pattern set). "The last match across all layers in
composition order wins" is computed here by walking layers forward and
only overwriting the running decision when a layer actually produces
one — the same answer as scanning backward and stopping at the first
opinion, just read the other way; see DESIGN.md for the equivalence
argument.
*/

use std::path::Path;

use crate::glob::GlobSet;
use crate::pattern::RuleLayer;
use crate::walker::to_forward_slash;

/// The outcome of classifying one path against one `EffectiveSpec`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Classification {
    Included,
    Excluded,
    Unmatched,
}

struct CompiledPattern {
    negated: bool,
    dir_only: bool,
}

/// One `RuleLayer` compiled into a `GlobSet`, plus the path prefix
/// (relative to the directory currently being visited) that candidates
/// must be stripped of before they can be matched against this layer's
/// patterns. A `Defaults`/`Override` layer has no anchor of its own and
/// uses an empty prefix.
struct CompiledLayer {
    anchor_prefix: String,
    set: GlobSet,
    meta: Vec<CompiledPattern>,
}

/// A compiled matcher for one directory visit, built from every `RuleLayer`
/// in scope at that directory, in composition order.
pub struct EffectiveSpec {
    layers: Vec<CompiledLayer>,
}

impl EffectiveSpec {
    /// Compile `layers` (already in composition order: `Defaults`, then
    /// `.gitignore` root-to-current, then `.contextfiles` root-to-current —
    /// or a single `Override` layer) into a matcher. `walk_target` is the
    /// directory paths passed to `classify` are expressed relative to;
    /// each layer's own anchor directory is re-expressed relative to it so
    /// a nested rule file's patterns stay anchored to where it was found.
    pub fn compile(layers: &[RuleLayer], walk_target: &Path) -> EffectiveSpec {
        let compiled = layers
            .iter()
            .map(|layer| compile_layer(layer, walk_target))
            .collect();
        EffectiveSpec { layers: compiled }
    }

    /// Classify a path relative to `walk_target`. `rel_path` must use
    /// forward slashes and carry no leading slash.
    pub fn classify(&self, rel_path: &str, is_dir: bool) -> Classification {
        let candidate = rel_path.trim_end_matches('/');
        let mut decision = Classification::Unmatched;

        for layer in &self.layers {
            let local = match candidate.strip_prefix(&layer.anchor_prefix) {
                Some(rest) => rest,
                None => continue,
            };
            let mut matches = layer.set.matches(local.as_bytes());
            matches.sort_unstable();
            for &idx in matches.iter().rev() {
                let m = &layer.meta[idx];
                if m.dir_only && !is_dir {
                    continue;
                }
                decision = if m.negated { Classification::Included } else { Classification::Excluded };
                break;
            }
        }
        decision
    }
}

fn compile_layer(layer: &RuleLayer, walk_target: &Path) -> CompiledLayer {
    let anchor_prefix = match layer.source.anchor() {
        None => String::new(),
        Some(dir) => {
            let rel = dir.strip_prefix(walk_target).unwrap_or(Path::new(""));
            let s = to_forward_slash(rel);
            if s.is_empty() {
                String::new()
            } else {
                format!("{s}/")
            }
        }
    };

    let mut regexes = Vec::with_capacity(layer.patterns.len());
    let mut meta = Vec::with_capacity(layer.patterns.len());
    for pat in &layer.patterns {
        regexes.push(pat.to_regex());
        meta.push(CompiledPattern { negated: pat.negated, dir_only: pat.dir_only });
    }
    let set = GlobSet::build(&regexes).expect("all patterns were already validated by Pattern::parse");
    CompiledLayer { anchor_prefix, set, meta }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{Pattern, RuleSource};
    use std::path::PathBuf;

    fn layer(source: RuleSource, pats: &[&str]) -> RuleLayer {
        RuleLayer::new(source, pats.iter().map(|p| Pattern::parse(p).unwrap()).collect())
    }

    #[test]
    fn unmatched_when_nothing_applies() {
        let spec = EffectiveSpec::compile(&[layer(RuleSource::Defaults, &["*.log"])], Path::new("/t"));
        assert_eq!(spec.classify("a.py", false), Classification::Unmatched);
    }

    #[test]
    fn simple_exclude() {
        let spec = EffectiveSpec::compile(&[layer(RuleSource::Defaults, &["*.log"])], Path::new("/t"));
        assert_eq!(spec.classify("a.log", false), Classification::Excluded);
    }

    #[test]
    fn negation_overrides_earlier_exclude() {
        let spec = EffectiveSpec::compile(
            &[layer(RuleSource::Contextfile(PathBuf::from("/t")), &["*.log", "!important.log"])],
            Path::new("/t"),
        );
        assert_eq!(spec.classify("important.log", false), Classification::Included);
        assert_eq!(spec.classify("a.log", false), Classification::Excluded);
    }

    #[test]
    fn last_match_wins_across_layers() {
        let defaults = layer(RuleSource::Defaults, &["*.log"]);
        let contextfile = layer(RuleSource::Contextfile(PathBuf::from("/t")), &["!important.log"]);
        let spec = EffectiveSpec::compile(&[defaults, contextfile], Path::new("/t"));
        assert_eq!(spec.classify("important.log", false), Classification::Included);
    }

    #[test]
    fn dir_only_pattern_ignores_files() {
        let spec = EffectiveSpec::compile(&[layer(RuleSource::Defaults, &["build/"])], Path::new("/t"));
        assert_eq!(spec.classify("build", false), Classification::Unmatched);
        assert_eq!(spec.classify("build", true), Classification::Excluded);
    }

    #[test]
    fn nested_layer_anchors_to_its_own_directory_not_walk_target() {
        // A `.contextfiles` found at /t/src should have its anchored
        // patterns match relative to src/, not to /t.
        let spec = EffectiveSpec::compile(
            &[layer(RuleSource::Contextfile(PathBuf::from("/t/src")), &["/build"])],
            Path::new("/t"),
        );
        assert_eq!(spec.classify("src/build", true), Classification::Excluded);
        // A top-level build/ dir must not be caught by src/'s anchored rule.
        assert_eq!(spec.classify("build", true), Classification::Unmatched);
    }
}
