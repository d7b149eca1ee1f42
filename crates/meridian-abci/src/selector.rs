use meridian_core::Tx;

/// Accumulates transactions for a proposal under byte and gas budgets.
///
/// A selector is reused across proposals; callers must `clear` it once the
/// selection has been taken.
pub trait TxSelector<T: Tx>: Send {
    /// Offer `tx` for inclusion. Returns `true` once the block is full and
    /// selection should stop. A tx that would overflow either budget is
    /// skipped without stopping.
    fn select_tx_for_proposal(&mut self, max_tx_bytes: u64, max_block_gas: u64, tx: &T) -> bool;

    fn selected_txs(&self) -> Vec<T>;

    fn clear(&mut self);
}

/// Greedy selector: keeps every tx that fits, in offer order.
/// `max_block_gas == 0` means gas is unbounded.
pub struct DefaultTxSelector<T> {
    total_tx_bytes: u64,
    total_tx_gas: u64,
    selected: Vec<T>,
}

impl<T> DefaultTxSelector<T> {
    pub fn new() -> Self {
        DefaultTxSelector {
            total_tx_bytes: 0,
            total_tx_gas: 0,
            selected: Vec::new(),
        }
    }

    pub fn total_tx_bytes(&self) -> u64 {
        self.total_tx_bytes
    }

    pub fn total_tx_gas(&self) -> u64 {
        self.total_tx_gas
    }
}

impl<T> Default for DefaultTxSelector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Tx> TxSelector<T> for DefaultTxSelector<T> {
    fn select_tx_for_proposal(&mut self, max_tx_bytes: u64, max_block_gas: u64, tx: &T) -> bool {
        let tx_size = tx.size();
        let fits_bytes = self.total_tx_bytes.saturating_add(tx_size) <= max_tx_bytes;

        if fits_bytes {
            if max_block_gas > 0 {
                let tx_gas = tx.gas_limit();
                if self.total_tx_gas.saturating_add(tx_gas) <= max_block_gas {
                    self.total_tx_gas += tx_gas;
                    self.total_tx_bytes += tx_size;
                    self.selected.push(tx.clone());
                }
            } else {
                self.total_tx_bytes += tx_size;
                self.selected.push(tx.clone());
            }
        }

        self.total_tx_bytes >= max_tx_bytes
            || (max_block_gas > 0 && self.total_tx_gas >= max_block_gas)
    }

    fn selected_txs(&self) -> Vec<T> {
        self.selected.clone()
    }

    fn clear(&mut self) {
        self.total_tx_bytes = 0;
        self.total_tx_gas = 0;
        self.selected.clear();
    }
}
