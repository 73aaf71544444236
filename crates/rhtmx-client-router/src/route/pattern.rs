//! Tokenizing of route patterns
//!
//! Pure functional scanning of pattern text into typed tokens. The compiler
//! in [`parser`](super::parser) and the URL builder in [`fill`] both work on
//! the token stream, so parameter names never have to be recovered from the
//! compiled regex afterwards.

use std::collections::HashMap;

/// A single unit of a route pattern
///
/// # Examples
///
/// ```
/// use rhtmx_client_router::route::pattern::{tokenize, PatternToken};
///
/// let tokens = tokenize("/docs(/:section)/*rest");
/// assert_eq!(
///     tokens,
///     vec![
///         PatternToken::Literal("/docs".to_string()),
///         PatternToken::GroupOpen,
///         PatternToken::Literal("/".to_string()),
///         PatternToken::Named("section".to_string()),
///         PatternToken::GroupClose,
///         PatternToken::Literal("/".to_string()),
///         PatternToken::Splat("rest".to_string()),
///     ]
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternToken {
    /// Text matched verbatim
    Literal(String),
    /// `:name`, one segment without `/` or `?`
    Named(String),
    /// `*name`, the rest of the path up to the query string
    Splat(String),
    /// `(`, start of an optional group
    GroupOpen,
    /// `)`, end of an optional group
    GroupClose,
}

impl PatternToken {
    /// Parameter name carried by a `Named` or `Splat` token
    pub fn param_name(&self) -> Option<&str> {
        match self {
            PatternToken::Named(name) | PatternToken::Splat(name) => Some(name),
            _ => None,
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Splits a pattern into tokens (pure function)
///
/// `:` and `*` only start a parameter when a name character follows them;
/// otherwise they are kept as literal text. Bracket balance is not checked
/// here, that is the compiler's job.
pub fn tokenize(pattern: &str) -> Vec<PatternToken> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();

    fn flush(literal: &mut String, tokens: &mut Vec<PatternToken>) {
        if !literal.is_empty() {
            tokens.push(PatternToken::Literal(std::mem::take(literal)));
        }
    }

    while let Some(c) = chars.next() {
        match c {
            '(' => {
                flush(&mut literal, &mut tokens);
                tokens.push(PatternToken::GroupOpen);
            }
            ')' => {
                flush(&mut literal, &mut tokens);
                tokens.push(PatternToken::GroupClose);
            }
            ':' | '*' if chars.peek().copied().is_some_and(is_name_char) => {
                flush(&mut literal, &mut tokens);
                let mut name = String::new();
                while let Some(&next) = chars.peek() {
                    if !is_name_char(next) {
                        break;
                    }
                    name.push(next);
                    chars.next();
                }
                tokens.push(if c == ':' {
                    PatternToken::Named(name)
                } else {
                    PatternToken::Splat(name)
                });
            }
            other => literal.push(other),
        }
    }

    flush(&mut literal, &mut tokens);
    tokens
}

/// Result of substituting values into a pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilledPattern {
    /// The rendered path. Unresolved required placeholders stay as `:name`.
    pub path: String,
    /// Required placeholders that had no value
    pub missing: Vec<String>,
}

/// Renders a pattern back into a path
///
/// Splats are dropped, `:name` placeholders are replaced with
/// percent-encoded values from `values`. An optional group is emitted
/// (without its parentheses) only when every placeholder inside it has a
/// value; otherwise the whole group is left out.
///
/// # Examples
///
/// ```
/// use rhtmx_client_router::route::pattern::fill;
/// use std::collections::HashMap;
///
/// let mut values = HashMap::new();
/// values.insert("section".to_string(), "faq".to_string());
///
/// let filled = fill("/docs/:section(/:subsection)/*rest", &values);
/// assert_eq!(filled.path, "/docs/faq/");
/// assert!(filled.missing.is_empty());
/// ```
pub fn fill(pattern: &str, values: &HashMap<String, String>) -> FilledPattern {
    let tokens = tokenize(pattern);
    let mut missing = Vec::new();
    let mut pos = 0;
    let path = fill_tokens(&tokens, &mut pos, values, &mut missing);
    FilledPattern { path, missing }
}

/// Renders tokens until the matching `GroupClose` (or the end), advancing `pos`
fn fill_tokens(
    tokens: &[PatternToken],
    pos: &mut usize,
    values: &HashMap<String, String>,
    missing: &mut Vec<String>,
) -> String {
    let mut out = String::new();

    while let Some(token) = tokens.get(*pos) {
        *pos += 1;
        match token {
            PatternToken::Literal(text) => out.push_str(text),
            PatternToken::Named(name) => match values.get(name) {
                Some(value) => out.push_str(&urlencoding::encode(value)),
                None => {
                    missing.push(name.clone());
                    out.push(':');
                    out.push_str(name);
                }
            },
            PatternToken::Splat(_) => {}
            PatternToken::GroupOpen => {
                let mut group_missing = Vec::new();
                let inner = fill_tokens(tokens, pos, values, &mut group_missing);
                if group_missing.is_empty() {
                    out.push_str(&inner);
                }
            }
            PatternToken::GroupClose => break,
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_literal_only() {
        assert_eq!(
            tokenize("/about/team"),
            vec![PatternToken::Literal("/about/team".to_string())]
        );
    }

    #[test]
    fn test_tokenize_named_and_splat() {
        assert_eq!(
            tokenize("/users/:id/*rest"),
            vec![
                PatternToken::Literal("/users/".to_string()),
                PatternToken::Named("id".to_string()),
                PatternToken::Literal("/".to_string()),
                PatternToken::Splat("rest".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_name_stops_at_non_word_char() {
        assert_eq!(
            tokenize("/files/:name.json"),
            vec![
                PatternToken::Literal("/files/".to_string()),
                PatternToken::Named("name".to_string()),
                PatternToken::Literal(".json".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_bare_colon_is_literal() {
        assert_eq!(
            tokenize("/time/12:/x*"),
            vec![PatternToken::Literal("/time/12:/x*".to_string())]
        );
    }

    #[test]
    fn test_tokenize_nested_groups() {
        assert_eq!(
            tokenize("(/a(/:b))"),
            vec![
                PatternToken::GroupOpen,
                PatternToken::Literal("/a".to_string()),
                PatternToken::GroupOpen,
                PatternToken::Literal("/".to_string()),
                PatternToken::Named("b".to_string()),
                PatternToken::GroupClose,
                PatternToken::GroupClose,
            ]
        );
    }

    #[test]
    fn test_fill_reports_missing_required() {
        let filled = fill("/users/:id/posts/:post", &HashMap::new());
        assert_eq!(filled.path, "/users/:id/posts/:post");
        assert_eq!(filled.missing, vec!["id".to_string(), "post".to_string()]);
    }

    #[test]
    fn test_fill_keeps_complete_optional_group() {
        let mut values = HashMap::new();
        values.insert("section".to_string(), "faq".to_string());
        values.insert("subsection".to_string(), "install".to_string());

        let filled = fill("/docs(/:section)(/:subsection)", &values);
        assert_eq!(filled.path, "/docs/faq/install");
    }

    #[test]
    fn test_fill_encodes_values() {
        let mut values = HashMap::new();
        values.insert("q".to_string(), "a b/c".to_string());

        let filled = fill("/search/:q", &values);
        assert_eq!(filled.path, "/search/a%20b%2Fc");
    }
}
