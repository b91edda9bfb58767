/*!
The glob module implements gitignore-style wildcard matching by compiling a
glob pattern into a regular expression. Doing it this way (rather than
walking the glob and the candidate path in lock-step) lets many patterns be
checked against a single path in one pass via a `RegexSet`, which is what
the rule compiler (see `spec_compiler.rs`) needs to answer "does anything in
this layer match, and what's the last thing that did."
*/

use std::fmt;

use regex::bytes::{Regex, RegexSet};

/// An error produced while parsing a single glob pattern.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum GlobError {
    #[error("invalid use of **; must be its own path component")]
    InvalidRecursive,
    #[error("unclosed character class; missing ']'")]
    UnclosedClass,
    #[error("invalid character range '{0}'-'{1}'")]
    InvalidRange(char, char),
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Token {
    Literal(char),
    Any,
    ZeroOrMore,
    RecursivePrefix,
    RecursiveSuffix,
    RecursiveZeroOrMore,
    Class { negated: bool, ranges: Vec<(char, char)> },
}

/// A single parsed glob pattern. Not useful for matching on its own; convert
/// it to a regex string with `to_regex` and compile that into a `RegexSet`
/// alongside its siblings.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Glob {
    tokens: Vec<Token>,
}

impl Glob {
    /// Parse a single gitignore-style glob pattern (no leading `!`, no
    /// trailing `/` — those are stripped by the caller before this is
    /// invoked; see `pattern.rs`).
    ///
    /// Parsing works path-component at a time: a `**` component is only
    /// meaningful as a whole component (leading, trailing, or standalone
    /// in the middle), so splitting on `/` first and classifying each
    /// component avoids the ambiguity of deciding what a lone `*` run
    /// means while scanning character-by-character.
    pub fn parse(pat: &str) -> Result<Glob, GlobError> {
        let segments: Vec<&str> = pat.split('/').collect();
        let mut glob = Glob::default();
        let last = segments.len() - 1;

        for (i, seg) in segments.iter().enumerate() {
            if *seg == "**" {
                if i == 0 {
                    glob.tokens.push(Token::RecursivePrefix);
                } else if i == last {
                    glob.tokens.push(Token::RecursiveSuffix);
                } else {
                    glob.tokens.push(Token::RecursiveZeroOrMore);
                }
                continue;
            }
            if seg.contains("**") {
                return Err(GlobError::InvalidRecursive);
            }
            // The separator before this segment is already folded into the
            // recursive token's own regex fragment when the previous
            // segment was "**"; only a plain component needs an explicit
            // '/' pushed ahead of it.
            if i > 0 && segments[i - 1] != "**" {
                glob.tokens.push(Token::Literal('/'));
            }
            parse_segment(seg, &mut glob.tokens)?;
        }
        Ok(glob)
    }

    /// Render this pattern as a regex matching a full candidate path.
    ///
    /// When `literal_separator` is true, `*` and `?` never match `/`, which
    /// is how gitignore treats a pattern that contains a literal `/`
    /// (anything but a lone trailing one) or that was given an explicit `/`
    /// anchor.
    pub fn to_regex(&self, literal_separator: bool) -> String {
        let mut re = String::from("(?-u)^");
        if self.tokens.len() == 1 && self.tokens[0] == Token::RecursivePrefix {
            re.push_str(".*$");
            return re;
        }
        for tok in &self.tokens {
            match *tok {
                Token::Literal(c) => re.push_str(&regex::escape(&c.to_string())),
                Token::Any => {
                    re.push_str(if literal_separator { "[^/]" } else { "." })
                }
                Token::ZeroOrMore => {
                    re.push_str(if literal_separator { "[^/]*" } else { ".*" })
                }
                Token::RecursivePrefix => re.push_str("(?:/?|.*/)"),
                Token::RecursiveSuffix => re.push_str("(?:/?|/.*)"),
                Token::RecursiveZeroOrMore => re.push_str("(?:/|/.*/)"),
                Token::Class { negated, ref ranges } => {
                    re.push('[');
                    if negated {
                        re.push('^');
                    }
                    for &(s, e) in ranges {
                        if s == e {
                            re.push_str(&regex::escape(&s.to_string()));
                        } else {
                            re.push_str(&regex::escape(&s.to_string()));
                            re.push('-');
                            re.push_str(&regex::escape(&e.to_string()));
                        }
                    }
                    re.push(']');
                }
            }
        }
        re.push('$');
        re
    }
}

impl fmt::Display for Glob {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_regex(false))
    }
}

/// Parse one non-`**` path component's characters (`*`, `?`, `[...]`,
/// literals) and append their tokens to `out`.
fn parse_segment(seg: &str, out: &mut Vec<Token>) -> Result<(), GlobError> {
    let mut chars = seg.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '?' => out.push(Token::Any),
            '*' => out.push(Token::ZeroOrMore),
            '[' => parse_class(&mut chars, out)?,
            c => out.push(Token::Literal(c)),
        }
    }
    Ok(())
}

fn parse_class(
    chars: &mut std::iter::Peekable<std::str::Chars>,
    out: &mut Vec<Token>,
) -> Result<(), GlobError> {
    fn extend_range(r: &mut (char, char), add: char) -> Result<(), GlobError> {
        r.1 = add;
        if r.1 < r.0 {
            Err(GlobError::InvalidRange(r.0, r.1))
        } else {
            Ok(())
        }
    }
    let mut negated = false;
    let mut ranges = vec![];
    if chars.peek() == Some(&'!') {
        chars.next();
        negated = true;
    }
    let mut first = true;
    let mut in_range = false;
    loop {
        let c = chars.next().ok_or(GlobError::UnclosedClass)?;
        match c {
            ']' if !first => break,
            ']' => ranges.push((']', ']')),
            '-' if first => ranges.push(('-', '-')),
            '-' if in_range => {
                extend_range(ranges.last_mut().unwrap(), '-')?;
                in_range = false;
            }
            '-' => in_range = true,
            c if in_range => extend_range(ranges.last_mut().unwrap(), c)?,
            c => ranges.push((c, c)),
        }
        first = false;
    }
    if in_range {
        ranges.push(('-', '-'));
    }
    out.push(Token::Class { negated, ranges });
    Ok(())
}

/// Compiles a fixed, ordered collection of glob patterns into a single
/// `RegexSet`, so all of them can be checked against a path in one pass.
/// The order in which patterns are added is preserved: callers recover
/// "which one matched last" by taking the greatest matched index.
pub struct GlobSet {
    set: RegexSet,
    /// A single combined regex used purely as a fast is-any-match probe.
    any: Regex,
}

impl GlobSet {
    pub fn build(regexes: &[String]) -> Result<GlobSet, GlobError> {
        let any_src = regexes
            .iter()
            .map(|r| format!("(?:{r})"))
            .collect::<Vec<_>>()
            .join("|");
        let any = if regexes.is_empty() {
            // A pattern that never matches.
            Regex::new("(?-u)a\\A").unwrap()
        } else {
            Regex::new(&any_src).map_err(|_| GlobError::InvalidRecursive)?
        };
        let set = RegexSet::new(regexes).map_err(|_| GlobError::InvalidRecursive)?;
        Ok(GlobSet { set, any })
    }

    /// Returns every pattern index (in ascending order) that matches `path`.
    pub fn matches(&self, path: &[u8]) -> Vec<usize> {
        if !self.any.is_match(path) {
            return vec![];
        }
        self.set.matches(path).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(pat: &str) -> Vec<Token> {
        Glob::parse(pat).unwrap().tokens
    }

    #[test]
    fn literal() {
        assert_eq!(tokens("ab"), vec![Token::Literal('a'), Token::Literal('b')]);
    }

    #[test]
    fn star_and_any() {
        assert_eq!(tokens("a*b?"), vec![
            Token::Literal('a'),
            Token::ZeroOrMore,
            Token::Literal('b'),
            Token::Any,
        ]);
    }

    #[test]
    fn recursive_prefix() {
        assert_eq!(tokens("**/foo"), vec![
            Token::RecursivePrefix,
            Token::Literal('f'),
            Token::Literal('o'),
            Token::Literal('o'),
        ]);
    }

    #[test]
    fn recursive_mid() {
        assert_eq!(tokens("a/**/b"), vec![
            Token::Literal('a'),
            Token::RecursiveZeroOrMore,
            Token::Literal('b'),
        ]);
    }

    #[test]
    fn invalid_recursive() {
        assert_eq!(Glob::parse("a**b").unwrap_err(), GlobError::InvalidRecursive);
    }

    #[test]
    fn unclosed_class() {
        assert_eq!(Glob::parse("[abc").unwrap_err(), GlobError::UnclosedClass);
    }

    #[test]
    fn matches_basic() {
        let g = Glob::parse("*.rs").unwrap();
        let re = Regex::new(&g.to_regex(true)).unwrap();
        assert!(re.is_match(b"main.rs"));
        assert!(!re.is_match(b"src/main.rs"));
        let re_any = Regex::new(&g.to_regex(false)).unwrap();
        assert!(re_any.is_match(b"src/main.rs"));
    }

    #[test]
    fn recursive_matches_any_depth() {
        let g = Glob::parse("**/foo").unwrap();
        let re = Regex::new(&g.to_regex(true)).unwrap();
        assert!(re.is_match(b"foo"));
        assert!(re.is_match(b"src/foo"));
        assert!(re.is_match(b"a/b/foo"));
        assert!(!re.is_match(b"foobar"));
    }

    #[test]
    fn globset_last_match_index() {
        let set = GlobSet::build(&[
            Glob::parse("*.log").unwrap().to_regex(true),
            Glob::parse("important.log").unwrap().to_regex(true),
        ])
        .unwrap();
        let mut matches = set.matches(b"important.log");
        matches.sort_unstable();
        assert_eq!(matches, vec![0, 1]);
        assert_eq!(*matches.last().unwrap(), 1);
    }
}
