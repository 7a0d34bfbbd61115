use std::time::Duration;

use tokio::time::Instant;

/// Holds back rapid query edits until input has been quiet for `delay`.
///
/// Pure bookkeeping: the event loop feeds it timestamps and sleeps until
/// [`deadline`](Self::deadline).
#[derive(Debug, Clone)]
pub struct QueryDebounce {
    delay: Duration,
    pending: Option<(String, Instant)>,
    last_committed: String,
}

impl QueryDebounce {
    #[must_use]
    pub fn new(delay: Duration, committed: &str) -> Self {
        Self {
            delay,
            pending: None,
            last_committed: committed.to_string(),
        }
    }

    /// Records a keystroke; restarts the quiet period.
    pub fn push(&mut self, text: impl Into<String>, now: Instant) {
        self.pending = Some((text.into(), now + self.delay));
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Text to commit once the quiet period has passed. Unchanged text is dropped.
    pub fn due(&mut self, now: Instant) -> Option<String> {
        let (_, at) = self.pending.as_ref()?;
        if now < *at {
            return None;
        }
        let (text, _) = self.pending.take()?;
        if text == self.last_committed {
            return None;
        }
        self.last_committed.clone_from(&text);
        Some(text)
    }

    /// Query changed elsewhere (reset, restore); forget anything pending.
    pub fn sync(&mut self, committed: &str) {
        self.pending = None;
        self.last_committed = committed.to_string();
    }
}
