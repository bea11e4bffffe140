use std::time::{Duration, Instant};

/// Quiet window applied when none is configured.
pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_millis(300);

/// Coalesces rapid search edits into a single query.
///
/// The debouncer never reads the clock itself; callers pass `now` so the
/// event loop and tests drive time explicitly.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, Instant};
/// use plate_archive::application::SearchDebouncer;
///
/// let start = Instant::now();
/// let mut debouncer = SearchDebouncer::new(Duration::from_millis(300));
/// debouncer.push("A", start);
/// debouncer.push("AB", start + Duration::from_millis(100));
///
/// assert_eq!(debouncer.poll(start + Duration::from_millis(200)), None);
/// assert_eq!(debouncer.poll(start + Duration::from_millis(400)), Some("AB".to_string()));
/// ```
#[derive(Debug)]
pub struct SearchDebouncer {
    quiet_window: Duration,
    buffered: Option<(String, Instant)>,
    last_emitted: String,
}

impl SearchDebouncer {
    /// Creates a debouncer that waits `quiet_window` after the last push.
    pub fn new(quiet_window: Duration) -> Self {
        Self {
            quiet_window,
            buffered: None,
            last_emitted: String::new(),
        }
    }

    /// Buffers `value` and restarts the quiet window.
    pub fn push(&mut self, value: impl Into<String>, now: Instant) {
        self.buffered = Some((value.into(), now));
    }

    /// Emits the buffered value once the quiet window has elapsed, unless it
    /// equals the last emitted value.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let (_, pushed_at) = self.buffered.as_ref()?;
        if now.duration_since(*pushed_at) < self.quiet_window {
            return None;
        }
        self.flush()
    }

    /// Emits the buffered value immediately, subject to the same
    /// distinctness rule as [`poll`](Self::poll).
    pub fn flush(&mut self) -> Option<String> {
        let (value, _) = self.buffered.take()?;
        if value == self.last_emitted {
            return None;
        }
        self.last_emitted = value.clone();
        Some(value)
    }

    /// When the buffered value becomes due, if anything is buffered.
    pub fn deadline(&self) -> Option<Instant> {
        self.buffered
            .as_ref()
            .map(|(_, pushed_at)| *pushed_at + self.quiet_window)
    }

    /// The value most recently emitted, `""` before the first emission.
    pub fn last_emitted(&self) -> &str {
        &self.last_emitted
    }

    /// Replaces the last emitted value without emitting anything.
    ///
    /// Used when an emitted search never took effect, so the same text can be
    /// emitted again.
    pub fn reset_last_emitted(&mut self, value: impl Into<String>) {
        self.last_emitted = value.into();
    }
}

impl Default for SearchDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_WINDOW)
    }
}
