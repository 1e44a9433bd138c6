use std::collections::HashSet;
use std::sync::Mutex;

use crate::ObjectId;

/// The set of objects already deciphered in a session.
///
/// Entries are never removed, so an object is deciphered at most once however many times it is
/// loaded.
#[derive(Debug, Default)]
pub struct DecryptionLedger {
    decrypted: Mutex<HashSet<ObjectId>>,
}

impl DecryptionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `id`, returning `false` if it was already present.
    pub fn record(&self, id: ObjectId) -> bool {
        self.lock().insert(id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.lock().contains(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<ObjectId>> {
        // The set stays consistent across a poisoning panic.
        self.decrypted.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn records_once() {
        let ledger = DecryptionLedger::new();
        assert!(ledger.is_empty());

        assert!(ledger.record((1, 0)));
        assert!(!ledger.record((1, 0)));
        assert!(ledger.record((1, 1)));

        assert!(ledger.contains((1, 0)));
        assert!(!ledger.contains((2, 0)));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn concurrent_record_has_one_winner() {
        let ledger = Arc::new(DecryptionLedger::new());
        let winners = Arc::new(AtomicUsize::new(0));

        let handles = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                let winners = Arc::clone(&winners);
                thread::spawn(move || {
                    if ledger.record((42, 0)) {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert_eq!(ledger.len(), 1);
    }
}
