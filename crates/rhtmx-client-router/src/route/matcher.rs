//! Matching of compiled patterns against URLs

use std::collections::HashMap;

use serde::Serialize;
use tracing::trace;

use super::parser::{compile, CompiledPattern, ParamKind};
use crate::error::RouterResult;
use crate::path::{parse_query, split_search, strip_root};

/// Named captures. `None` marks a parameter whose optional group did not
/// take part in the match: present but unset.
pub type RouteParams = HashMap<String, Option<String>>;

/// Raw splat captures, keyed by the splat's name
pub type TailParams = HashMap<String, String>;

/// The part of a URL left over for child routes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tail {
    /// URL consumed by the ancestors and the route itself
    pub prefix: String,
    /// Remaining URL, always starting with `/`
    pub path: String,
    /// Named params accumulated from the root route down to this one
    pub route_params: RouteParams,
}

/// Outcome of matching one route against one URL
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub matches: bool,
    pub route_params: RouteParams,
    pub route_tail_param: TailParams,
    pub tail: Option<Tail>,
    /// Raw query string without the leading `?`. Never decoded.
    pub query: Option<String>,
}

impl MatchResult {
    /// The result for a URL that does not match
    pub fn no_match() -> Self {
        Self::default()
    }

    /// Decoded query pairs, in URL order
    pub fn query_params(&self) -> Vec<(String, String)> {
        self.query.as_deref().map(parse_query).unwrap_or_default()
    }

    /// Whether both results match with the same named params
    ///
    /// Query strings and splat captures are ignored; they can change without
    /// swapping the rendered element.
    pub fn same_base(&self, other: &MatchResult) -> bool {
        self.matches && other.matches && self.route_params == other.route_params
    }

    /// Re-roots this result under a parent's tail
    ///
    /// The own tail's prefix is appended to the parent's prefix, and the
    /// parent's accumulated params are merged under the own ones.
    pub(crate) fn nest_under(mut self, parent: &Tail) -> Self {
        if let Some(tail) = self.tail.as_mut() {
            tail.prefix = format!("{}{}", parent.prefix, tail.prefix);
            let mut params = parent.route_params.clone();
            params.extend(tail.route_params.drain());
            tail.route_params = params;
        }
        self
    }
}

fn decode(value: &str) -> String {
    urlencoding::decode(value)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

impl CompiledPattern {
    /// Matches a root-relative path (plus optional query string)
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_client_router::route::parser::compile;
    ///
    /// let compiled = compile("/docs/:section(/:subsection)").unwrap();
    /// let result = compiled.match_path("/docs/faq");
    /// assert!(result.matches);
    /// assert_eq!(result.route_params["section"], Some("faq".to_string()));
    /// assert_eq!(result.route_params["subsection"], None);
    /// ```
    pub fn match_path(&self, path: &str) -> MatchResult {
        let Some(caps) = self.regex().captures(path) else {
            trace!(pattern = self.pattern(), path, "no match");
            return MatchResult::no_match();
        };

        let query = caps.get(self.query_group());
        // End of the path portion, before any `?`
        let path_end = query.map(|m| m.start() - 1).unwrap_or(path.len());

        let mut route_params = RouteParams::new();
        let mut route_tail_param = TailParams::new();
        let mut splat: Option<(usize, &str)> = None;

        for (index, spec) in self.params().iter().enumerate() {
            let capture = caps.get(index + 1);
            match spec.kind {
                ParamKind::Named => {
                    let value = capture
                        .map(|m| m.as_str())
                        .filter(|v| !v.is_empty())
                        .map(decode);
                    route_params.insert(spec.name.clone(), value);
                }
                ParamKind::Splat => {
                    let raw = capture.map(|m| m.as_str()).unwrap_or("");
                    let start = capture.map(|m| m.start()).unwrap_or(path_end);
                    route_tail_param.insert(spec.name.clone(), raw.to_string());
                    splat = Some((start, raw));
                }
            }
        }

        let tail = splat.map(|(start, raw)| Tail {
            prefix: path[..start].trim_end_matches('/').to_string(),
            path: format!("/{}", raw),
            route_params: route_params.clone(),
        });

        trace!(pattern = self.pattern(), path, "matched");

        MatchResult {
            matches: true,
            route_params,
            route_tail_param,
            tail,
            query: query.map(|m| m.as_str().to_string()),
        }
    }

    /// Matches a URL against this pattern under a parent link
    ///
    /// Top-level routes match the URL with the root prefix removed. Child
    /// routes match their parent's tail path plus the URL's query string, and
    /// never match while the parent has no tail.
    pub fn match_under(&self, parent: &ParentRoute, url: &str, root: &str) -> MatchResult {
        match parent {
            ParentRoute::Root => self.match_path(&strip_root(url, root)),
            ParentRoute::Child(Some(tail)) => {
                let (_, search) = split_search(url);
                self.match_path(&format!("{}{}", tail.path, search))
                    .nest_under(tail)
            }
            ParentRoute::Child(None) => MatchResult::no_match(),
        }
    }
}

/// Where a route takes its URL from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ParentRoute {
    /// A top-level route matching the window URL
    #[default]
    Root,
    /// A nested route matching the tail of its nearest ancestor.
    /// `None` while the ancestor does not match.
    Child(Option<Tail>),
}

/// Compiles `pattern` and matches it against `url`
///
/// `root` is stripped from the front of `url` first unless it is `/`.
///
/// # Examples
///
/// ```
/// use rhtmx_client_router::match_pattern;
///
/// let result = match_pattern("/docs(/:section)(/:subsection)/*routeTail",
///     "/docs/faq/install/route/tail", "/").unwrap();
///
/// let tail = result.tail.unwrap();
/// assert_eq!(tail.prefix, "/docs/faq/install");
/// assert_eq!(tail.path, "/route/tail");
/// assert_eq!(result.route_tail_param["routeTail"], "route/tail");
/// ```
pub fn match_pattern(pattern: &str, url: &str, root: &str) -> RouterResult<MatchResult> {
    let compiled = compile(pattern)?;
    Ok(compiled.match_path(&strip_root(url, root)))
}
