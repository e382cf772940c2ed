use secret_confidential::Nonce;

/// Nonces of a transaction's messages, keyed by message index.
///
/// A slot is `None` when the message carried no encrypted input. The ledger is
/// filled while decrypting inputs and only read afterwards, every other
/// decryptor correlates its ciphertexts to a message through it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NonceLedger {
    slots: Vec<Option<Nonce>>,
}

impl NonceLedger {
    /// Creates a ledger with `len` empty slots
    #[must_use]
    pub fn with_capacity(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    /// Records the nonce of the message at `index`, growing the ledger if needed
    pub(crate) fn insert(&mut self, index: usize, nonce: Nonce) {
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        self.slots[index] = Some(nonce);
    }

    /// Returns the nonce of the message at `index`, if it had one
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Nonce> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Iterates over the recorded nonces in message index order, skipping empty slots
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Nonce)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|nonce| (index, nonce)))
    }

    /// Number of slots, recorded or not
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl FromIterator<Option<Nonce>> for NonceLedger {
    fn from_iter<I: IntoIterator<Item = Option<Nonce>>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_capacity_has_empty_slots() {
        let ledger = NonceLedger::with_capacity(3);
        assert_eq!(ledger.len(), 3);
        assert!(!ledger.is_empty());
        assert_eq!(ledger.get(0), None);
        assert_eq!(ledger.iter().count(), 0);
    }

    #[test]
    fn test_iter_skips_empty_slots_in_index_order() {
        let ledger: NonceLedger = [Some([1u8; 32]), None, Some([3u8; 32])]
            .into_iter()
            .collect();
        let visited: Vec<(usize, u8)> = ledger.iter().map(|(i, n)| (i, n[0])).collect();
        assert_eq!(visited, vec![(0, 1), (2, 3)]);
    }

    #[test]
    fn test_insert_grows_ledger() {
        let mut ledger = NonceLedger::default();
        assert!(ledger.is_empty());
        ledger.insert(2, [7u8; 32]);
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.get(2), Some(&[7u8; 32]));
        assert_eq!(ledger.get(1), None);
        assert_eq!(ledger.get(9), None);
    }
}
