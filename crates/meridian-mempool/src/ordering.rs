use std::cmp::Reverse;

/// Ordering mode for transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderingMode {
    /// Highest `Tx::priority` first, insertion order among equals
    #[default]
    Priority,
    /// Insertion order
    Fifo,
}

/// Sort key inside the pool; smaller keys are selected first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct OrderKey {
    rank: Reverse<u64>,
    seq: u64,
}

impl OrderKey {
    pub fn new(mode: OrderingMode, priority: u64, seq: u64) -> Self {
        let rank = match mode {
            OrderingMode::Priority => priority,
            OrderingMode::Fifo => 0,
        };
        OrderKey {
            rank: Reverse(rank),
            seq,
        }
    }

    pub fn priority(&self) -> u64 {
        self.rank.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_mode_orders_by_priority_then_arrival() {
        let high = OrderKey::new(OrderingMode::Priority, 10, 5);
        let low_early = OrderKey::new(OrderingMode::Priority, 1, 0);
        let low_late = OrderKey::new(OrderingMode::Priority, 1, 1);

        assert!(high < low_early);
        assert!(low_early < low_late);
    }

    #[test]
    fn test_fifo_mode_ignores_priority() {
        let first = OrderKey::new(OrderingMode::Fifo, 1, 0);
        let second = OrderKey::new(OrderingMode::Fifo, 100, 1);
        assert!(first < second);
    }
}
