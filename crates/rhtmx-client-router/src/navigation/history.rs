//! Browser history seam
//!
//! The router only needs the current pathname plus search string and a way to
//! push or replace entries. [`History`] is that contract; a wasm host wraps
//! `window.history`, while [`MemoryHistory`] keeps the entries in memory.

/// Access to browser-visible history
pub trait History {
    /// Scheme, host and port of the page, e.g. `https://example.com`
    fn origin(&self) -> String;

    /// Current pathname plus search string, e.g. `/users/3?tab=posts`
    fn location(&self) -> String;

    /// Adds a new entry and makes it current
    fn push_state(&mut self, url: &str);

    /// Replaces the current entry
    fn replace_state(&mut self, url: &str);

    /// Moves one entry back. Returns false when there is nothing to go back to.
    fn back(&mut self) -> bool {
        false
    }

    /// Moves one entry forward. Returns false at the newest entry.
    fn forward(&mut self) -> bool {
        false
    }
}

/// In-memory history with back/forward navigation
///
/// # Examples
///
/// ```
/// use rhtmx_client_router::{History, MemoryHistory};
///
/// let mut history = MemoryHistory::new("/");
/// history.push_state("/page1");
/// history.push_state("/page2");
///
/// assert!(history.back());
/// assert_eq!(history.location(), "/page1");
/// assert!(history.forward());
/// assert_eq!(history.location(), "/page2");
/// ```
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    origin: String,
    entries: Vec<String>,
    index: usize,
}

impl MemoryHistory {
    /// Creates a history at `initial_url` on `http://localhost`
    pub fn new(initial_url: impl Into<String>) -> Self {
        Self::with_origin("http://localhost", initial_url)
    }

    pub fn with_origin(origin: impl Into<String>, initial_url: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
            entries: vec![initial_url.into()],
            index: 0,
        }
    }

    /// Number of entries, including those ahead of the current one
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl History for MemoryHistory {
    fn origin(&self) -> String {
        self.origin.clone()
    }

    fn location(&self) -> String {
        self.entries[self.index].clone()
    }

    fn push_state(&mut self, url: &str) {
        // A push drops any forward entries
        self.entries.truncate(self.index + 1);
        self.entries.push(url.to_string());
        self.index = self.entries.len() - 1;
    }

    fn replace_state(&mut self, url: &str) {
        self.entries[self.index] = url.to_string();
    }

    fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    fn forward(&mut self) -> bool {
        if self.index + 1 >= self.entries.len() {
            return false;
        }
        self.index += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_truncates_forward_entries() {
        let mut history = MemoryHistory::new("/");
        history.push_state("/a");
        history.push_state("/b");
        history.back();
        history.push_state("/c");

        assert_eq!(history.entries(), &["/", "/a", "/c"]);
        assert!(!history.forward());
    }

    #[test]
    fn test_replace_keeps_length() {
        let mut history = MemoryHistory::new("/");
        history.replace_state("/x");
        assert_eq!(history.len(), 1);
        assert_eq!(history.location(), "/x");
    }

    #[test]
    fn test_back_at_start() {
        let mut history = MemoryHistory::default();
        assert!(!history.back());
        assert_eq!(history.origin(), "http://localhost");
    }
}
