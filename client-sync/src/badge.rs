//! Unread notification badge driven by polling.

/// Marks a poll so that an answer started before the badge was zeroed is dropped
#[derive(Debug, Clone, Copy)]
pub struct PollTicket(u64);

#[derive(Debug, Default)]
pub struct UnreadBadge {
    count: u64,
    generation: u64,
}

impl UnreadBadge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_visible(&self) -> bool {
        self.count > 0
    }

    pub fn begin_poll(&self) -> PollTicket {
        PollTicket(self.generation)
    }

    /// Apply a polled count. Returns false when the answer was stale.
    pub fn apply_poll(&mut self, ticket: PollTicket, count: u64) -> bool {
        if ticket.0 != self.generation {
            return false;
        }
        self.count = count;
        true
    }

    /// Listing notifications marks them all read
    pub fn after_list_fetch(&mut self) {
        self.reset();
    }

    pub fn after_mark_all_read(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.count = 0;
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_then_fetch_zeroes_badge() {
        let mut badge = UnreadBadge::new();
        let ticket = badge.begin_poll();
        assert!(badge.apply_poll(ticket, 3));
        assert!(badge.is_visible());

        badge.after_list_fetch();
        assert_eq!(badge.count(), 0);
    }

    #[test]
    fn test_stale_poll_is_ignored_after_mark_all_read() {
        let mut badge = UnreadBadge::new();
        let in_flight = badge.begin_poll();
        badge.after_mark_all_read();

        assert!(!badge.apply_poll(in_flight, 5));
        assert_eq!(badge.count(), 0);

        let fresh = badge.begin_poll();
        assert!(badge.apply_poll(fresh, 1));
        assert_eq!(badge.count(), 1);
    }
}
