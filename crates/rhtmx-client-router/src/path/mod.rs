//! URL utilities for root stripping, query handling and path joining
//!
//! All functions are **pure**: given same input, always produce same output with no side effects.

use std::borrow::Cow;

use url::form_urlencoded;

/// Normalizes a root prefix to `/segment...` without a trailing slash
///
/// # Examples
///
/// ```
/// use rhtmx_client_router::path::normalize_root;
///
/// assert_eq!(normalize_root("app"), "/app");
/// assert_eq!(normalize_root("/app/"), "/app");
/// assert_eq!(normalize_root(""), "/");
/// ```
pub fn normalize_root(root: &str) -> String {
    let trimmed = root.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Removes the root prefix from the front of a URL
///
/// The prefix is only removed on a segment boundary, so the root `/app`
/// leaves `/application` alone. A URL equal to the root becomes `/`.
///
/// # Examples
///
/// ```
/// use rhtmx_client_router::path::strip_root;
///
/// assert_eq!(strip_root("/app/users", "/app"), "/users");
/// assert_eq!(strip_root("/app?x=1", "/app"), "/?x=1");
/// assert_eq!(strip_root("/application", "/app"), "/application");
/// assert_eq!(strip_root("/users", "/"), "/users");
/// ```
pub fn strip_root<'a>(url: &'a str, root: &str) -> Cow<'a, str> {
    if root == "/" || root.is_empty() {
        return Cow::Borrowed(url);
    }

    match url.strip_prefix(root) {
        Some("") => Cow::Borrowed("/"),
        Some(rest) if rest.starts_with('/') => Cow::Borrowed(rest),
        Some(rest) if rest.starts_with('?') => Cow::Owned(format!("/{}", rest)),
        _ => Cow::Borrowed(url),
    }
}

/// Splits a URL into its path and its search string (including the `?`)
///
/// # Examples
///
/// ```
/// use rhtmx_client_router::path::split_search;
///
/// assert_eq!(split_search("/a/b?x=1"), ("/a/b", "?x=1"));
/// assert_eq!(split_search("/a/b"), ("/a/b", ""));
/// ```
pub fn split_search(url: &str) -> (&str, &str) {
    match url.find('?') {
        Some(index) => url.split_at(index),
        None => (url, ""),
    }
}

/// Decodes a query string (with or without the leading `?`) into pairs
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    let query = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

/// Encodes pairs into a query string without the leading `?`
pub fn to_query_string<K, V>(pairs: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key.as_ref(), value.as_ref());
    }
    serializer.finish()
}

/// Applies updates to a list of query pairs
///
/// `Some(value)` replaces every pair with that key by one pair (keeping the
/// position of the first), or appends it when the key is new. `None`
/// deletes the key.
///
/// # Examples
///
/// ```
/// use rhtmx_client_router::path::merge_query;
///
/// let current = vec![
///     ("page".to_string(), "1".to_string()),
///     ("sort".to_string(), "name".to_string()),
/// ];
/// let merged = merge_query(&current, &[("page", Some("2")), ("sort", None), ("q", Some("x"))]);
/// assert_eq!(
///     merged,
///     vec![("page".to_string(), "2".to_string()), ("q".to_string(), "x".to_string())]
/// );
/// ```
pub fn merge_query<K, V>(current: &[(String, String)], updates: &[(K, Option<V>)]) -> Vec<(String, String)>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut merged: Vec<(String, String)> = current.to_vec();

    for (key, value) in updates {
        let key = key.as_ref();
        match value {
            Some(value) => {
                let value = value.as_ref().to_string();
                match merged.iter().position(|(k, _)| k == key) {
                    Some(first) => {
                        merged[first].1 = value;
                        let mut index = 0;
                        merged.retain(|(k, _)| {
                            let keep = k != key || index == first;
                            index += 1;
                            keep
                        });
                    }
                    None => merged.push((key.to_string(), value)),
                }
            }
            None => merged.retain(|(k, _)| k != key),
        }
    }

    merged
}

/// Joins path pieces and collapses the empty segments between them
///
/// A trailing slash is dropped unless the result is the root.
///
/// # Examples
///
/// ```
/// use rhtmx_client_router::path::join_paths;
///
/// assert_eq!(join_paths(["/users/", "/profile/7"]), "/users/profile/7");
/// assert_eq!(join_paths(["/", "/"]), "/");
/// assert_eq!(join_paths(["/docs/faq/"]), "/docs/faq");
/// ```
pub fn join_paths<I, S>(pieces: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = pieces
        .into_iter()
        .map(|piece| piece.as_ref().to_string())
        .collect::<Vec<_>>()
        .join("/");

    let segments: Vec<&str> = joined.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_root_requires_segment_boundary() {
        assert_eq!(strip_root("/app", "/app"), "/");
        assert_eq!(strip_root("/app/", "/app"), "/");
        assert_eq!(strip_root("/apple", "/app"), "/apple");
        assert_eq!(strip_root("/other/app", "/app"), "/other/app");
    }

    #[test]
    fn test_strip_root_borrows_when_possible() {
        assert!(matches!(strip_root("/app/x", "/app"), Cow::Borrowed("/x")));
        assert!(matches!(strip_root("/x", "/"), Cow::Borrowed("/x")));
    }

    #[test]
    fn test_parse_query_with_and_without_question_mark() {
        let expected = vec![("a".to_string(), "1 2".to_string())];
        assert_eq!(parse_query("?a=1+2"), expected);
        assert_eq!(parse_query("a=1%202"), expected);
        assert!(parse_query("").is_empty());
    }

    #[test]
    fn test_to_query_string_encodes() {
        assert_eq!(to_query_string(&[("q", "a b&c")]), "q=a+b%26c");
    }

    #[test]
    fn test_merge_query_collapses_duplicate_keys() {
        let current = vec![
            ("tag".to_string(), "a".to_string()),
            ("x".to_string(), "1".to_string()),
            ("tag".to_string(), "b".to_string()),
        ];
        let merged = merge_query(&current, &[("tag", Some("c"))]);
        assert_eq!(
            merged,
            vec![
                ("tag".to_string(), "c".to_string()),
                ("x".to_string(), "1".to_string())
            ]
        );
    }

    #[test]
    fn test_join_paths_empty_input_is_root() {
        assert_eq!(join_paths(Vec::<String>::new()), "/");
        assert_eq!(join_paths(["", "a"]), "/a");
    }
}
