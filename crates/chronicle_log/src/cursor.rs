//! Forward-only replay cursor.

/// Position of the first not-yet-applied entry in a log.
///
/// Replay is driven by monotonically increasing target times, so
/// the cursor only moves forward; rewinding means starting a new
/// pass from a fresh cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    position: usize,
}

impl Cursor {
    /// Cursor at the start of a log
    #[must_use]
    pub const fn new() -> Self {
        Self { position: 0 }
    }

    /// Cursor at a known position
    #[must_use]
    pub const fn at(position: usize) -> Self {
        Self { position }
    }

    /// Current position
    #[must_use]
    pub const fn pos(&self) -> usize {
        self.position
    }

    /// Advance by `count` entries, saturating
    pub fn advance(&mut self, count: usize) {
        self.position = self.position.saturating_add(count);
    }
}
