/// In-memory back/forward stack of visited URLs.
///
/// Mirrors what a browser keeps per tab: pushing truncates the forward
/// history, traversal only moves the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHistory {
    entries: Vec<String>,
    idx: usize,
}

impl SessionHistory {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: vec![initial.into()],
            idx: 0,
        }
    }

    pub fn current(&self) -> &str {
        &self.entries[self.idx]
    }

    pub fn can_go_back(&self) -> bool {
        self.idx > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.idx + 1 < self.entries.len()
    }

    /// Record a new entry. A push equal to the current URL is ignored.
    pub fn push(&mut self, url: impl Into<String>) {
        let url = url.into();
        if self.entries[self.idx] == url {
            return;
        }
        // Truncate forward history before pushing
        self.entries.truncate(self.idx + 1);
        self.entries.push(url);
        self.idx = self.entries.len() - 1;
    }

    /// Overwrite the current entry (used for redirects).
    pub fn replace(&mut self, url: impl Into<String>) {
        self.entries[self.idx] = url.into();
    }

    /// Step back; returns the URL now current.
    pub fn back(&mut self) -> Option<&str> {
        if !self.can_go_back() {
            return None;
        }
        self.idx -= 1;
        Some(self.current())
    }

    /// Step forward; returns the URL now current.
    pub fn forward(&mut self) -> Option<&str> {
        if !self.can_go_forward() {
            return None;
        }
        self.idx += 1;
        Some(self.current())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
