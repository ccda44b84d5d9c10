/// A consistent snapshot of a calculation's `(completed, total)` pair.
///
/// `completed <= total` holds for every `Units` produced by this crate.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Units {
    pub completed: u64,
    pub total: u64,
}

impl Units {
    /// Fraction of work done, in `[0.0, 1.0]`.
    /// Zero total counts as no progress rather than as done.
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else if self.completed >= self.total {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    /// Exact equality of the two counters.
    pub fn is_completed(&self) -> bool {
        self.completed == self.total
    }

    /// Reassigning the total always restarts the count.
    pub(crate) fn set_total(&mut self, total: u64) {
        self.total = total;
        self.completed = 0;
    }

    pub(crate) fn increment(&mut self, n: u64) {
        self.completed = self.completed.saturating_add(n).min(self.total);
    }

    pub(crate) fn decrement(&mut self, n: u64) {
        self.completed = self.completed.saturating_sub(n).min(self.total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress() {
        assert_eq!(Units { completed: 0, total: 0 }.progress(), 0.0);
        assert_eq!(Units { completed: 4, total: 4 }.progress(), 1.0);
        assert_eq!(Units { completed: 1, total: 4 }.progress(), 0.25);
        assert_eq!(Units { completed: 0, total: 7 }.progress(), 0.0);
    }

    #[test]
    fn test_clamping() {
        let mut units = Units::default();
        units.set_total(10);
        for _ in 0..15 {
            units.increment(1);
        }
        assert_eq!(units.completed, 10);
        assert_eq!(units.progress(), 1.0);
        for _ in 0..20 {
            units.decrement(1);
        }
        assert_eq!(units.completed, 0);
        assert_eq!(units.progress(), 0.0);

        units.increment(u64::MAX);
        assert_eq!(units.completed, 10);
    }

    #[test]
    fn test_set_total_resets_completed() {
        let mut units = Units::default();
        units.set_total(5);
        units.increment(3);
        units.set_total(8);
        assert_eq!(units, Units { completed: 0, total: 8 });
        units.increment(8);
        units.set_total(8);
        assert_eq!(units.completed, 0);
    }
}
