//! Pattern compilation
//!
//! Folds the token stream of a pattern into an anchored regular expression
//! and, in the same pass, the ordered list of parameters behind its capturing
//! groups. Group `n + 1` of the regex always belongs to `params[n]`; the group
//! after the last parameter captures the query string.

use regex::Regex;
use tracing::trace;

use super::pattern::{tokenize, PatternToken};
use crate::error::{RouterError, RouterResult};

/// Source of a named parameter group: one or more characters except `/` and `?`
const NAMED_GROUP: &str = "([^/?]+)";
/// Source of a splat group: any characters except `?`, as few as possible
const SPLAT_GROUP: &str = "([^?]*?)";
/// Trailing optional query string, captured without the leading `?`
const QUERY_GROUP: &str = r"(?:\?((?s:.*)))?";

/// Kind of a capturing parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// `:name`
    Named,
    /// `*name`
    Splat,
}

/// A parameter of a compiled pattern, in capturing-group order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    /// Name without the `:` or `*` sigil
    pub name: String,
    pub kind: ParamKind,
    /// Whether the parameter sits inside an optional group
    pub optional: bool,
}

/// A route pattern compiled into a matcher
///
/// Built once per distinct pattern string and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pattern: String,
    regex: Regex,
    params: Vec<ParamSpec>,
}

impl CompiledPattern {
    /// The pattern text this was compiled from
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The generated regex
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Parameters in capturing-group order
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Whether the pattern ends in a splat and so produces a tail
    pub fn has_splat(&self) -> bool {
        self.params.iter().any(|p| p.kind == ParamKind::Splat)
    }

    /// Index of the capturing group holding the query string
    pub(crate) fn query_group(&self) -> usize {
        self.params.len() + 1
    }
}

/// Fold accumulator for compilation
///
/// Each step consumes the state and returns it, or the reason the pattern is
/// rejected.
#[derive(Default)]
struct ParseState {
    source: String,
    params: Vec<ParamSpec>,
    depth: usize,
    splat_seen: bool,
}

impl ParseState {
    fn ensure_before_splat(&self, what: &str) -> Result<(), String> {
        if self.splat_seen {
            Err(format!("{} after the splat parameter", what))
        } else {
            Ok(())
        }
    }

    fn with_literal(mut self, text: &str) -> Result<Self, String> {
        self.ensure_before_splat("literal text")?;
        self.source.push_str(&regex::escape(text));
        Ok(self)
    }

    fn with_named(mut self, name: &str) -> Result<Self, String> {
        self.ensure_before_splat(&format!("`:{}`", name))?;
        self.source.push_str(NAMED_GROUP);
        self.params.push(ParamSpec {
            name: name.to_string(),
            kind: ParamKind::Named,
            optional: self.depth > 0,
        });
        Ok(self)
    }

    fn with_splat(mut self, name: &str) -> Result<Self, String> {
        if self.splat_seen {
            return Err(format!("second splat parameter `*{}`", name));
        }
        self.source.push_str(SPLAT_GROUP);
        self.params.push(ParamSpec {
            name: name.to_string(),
            kind: ParamKind::Splat,
            optional: self.depth > 0,
        });
        self.splat_seen = true;
        Ok(self)
    }

    fn open_group(mut self) -> Result<Self, String> {
        self.ensure_before_splat("`(`")?;
        self.source.push_str("(?:");
        self.depth += 1;
        Ok(self)
    }

    fn close_group(mut self) -> Result<Self, String> {
        if self.depth == 0 {
            return Err("unmatched `)`".to_string());
        }
        self.source.push_str(")?");
        self.depth -= 1;
        Ok(self)
    }

    fn step(self, token: &PatternToken) -> Result<Self, String> {
        match token {
            PatternToken::Literal(text) => self.with_literal(text),
            PatternToken::Named(name) => self.with_named(name),
            PatternToken::Splat(name) => self.with_splat(name),
            PatternToken::GroupOpen => self.open_group(),
            PatternToken::GroupClose => self.close_group(),
        }
    }

    fn finalize(self) -> Result<(String, Vec<ParamSpec>), String> {
        if self.depth > 0 {
            return Err(format!("{} unclosed `(`", self.depth));
        }
        Ok((format!("^{}{}$", self.source, QUERY_GROUP), self.params))
    }
}

/// Compiles a route pattern (pure function)
///
/// Rejects empty patterns, unbalanced parentheses, a second splat and
/// anything other than `)` after a splat.
///
/// # Examples
///
/// ```
/// use rhtmx_client_router::route::parser::{compile, ParamKind};
///
/// let compiled = compile("/docs(/:section)/*rest").unwrap();
/// let names: Vec<&str> = compiled.params().iter().map(|p| p.name.as_str()).collect();
/// assert_eq!(names, vec!["section", "rest"]);
/// assert_eq!(compiled.params()[1].kind, ParamKind::Splat);
///
/// assert!(compile("/docs(/:section").is_err());
/// ```
pub fn compile(pattern: &str) -> RouterResult<CompiledPattern> {
    if pattern.is_empty() {
        return Err(RouterError::invalid_pattern(pattern, "pattern is empty"));
    }

    let (source, params) = tokenize(pattern)
        .iter()
        .try_fold(ParseState::default(), ParseState::step)
        .and_then(ParseState::finalize)
        .map_err(|reason| RouterError::invalid_pattern(pattern, reason))?;

    let regex = Regex::new(&source)
        .map_err(|err| RouterError::invalid_pattern(pattern, err.to_string()))?;

    trace!(pattern, regex = %source, params = params.len(), "compiled route pattern");

    Ok(CompiledPattern {
        pattern: pattern.to_string(),
        regex,
        params,
    })
}
