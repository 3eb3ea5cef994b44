use tokio::sync::watch;

/// Where the application currently is.
///
/// `push` is an in-app navigation committed by the router; `assign` is a
/// hard redirect that discards in-app state (a full page load in a browser).
pub trait Location: Send + Sync {
    fn current_path(&self) -> String;
    fn push(&self, path: &str);
    fn assign(&self, path: &str);
}

/// Location kept in memory, observable through a watch channel
pub struct MemoryLocation {
    current: watch::Sender<String>,
    hard_redirects: watch::Sender<Vec<String>>,
}

impl MemoryLocation {
    pub fn new(initial: impl Into<String>) -> Self {
        let (current, _) = watch::channel(initial.into());
        let (hard_redirects, _) = watch::channel(Vec::new());
        Self { current, hard_redirects }
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.current.subscribe()
    }

    /// Every hard redirect performed so far, oldest first
    pub fn hard_redirects(&self) -> Vec<String> {
        self.hard_redirects.borrow().clone()
    }
}

impl Default for MemoryLocation {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Location for MemoryLocation {
    fn current_path(&self) -> String {
        self.current.borrow().clone()
    }

    fn push(&self, path: &str) {
        self.current.send_replace(path.to_string());
    }

    fn assign(&self, path: &str) {
        tracing::info!(from = %self.current_path(), to = %path, "hard redirect");
        self.hard_redirects.send_modify(|h| h.push(path.to_string()));
        self.current.send_replace(path.to_string());
    }
}
