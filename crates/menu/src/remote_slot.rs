//! The synchronization-side belief about one remotely observed slot.

use mdcontainer_core::{HashedStack, ItemStack};

/// Last-known remote state of a slot (or of the carried stack).
///
/// Holds either a full copy of the stack the remote is believed to have, or a
/// compact hash token reported by the remote, never both. A fresh cell knows
/// nothing and matches nothing.
#[derive(Debug, Clone, Default)]
pub struct RemoteSlot {
    known: Known,
}

#[derive(Debug, Clone, Default)]
enum Known {
    #[default]
    Unknown,
    Stack(ItemStack),
    Hashed(HashedStack),
}

impl RemoteSlot {
    /// A cell with no knowledge of the remote state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditionally overwrite the belief with a full copy.
    ///
    /// Used when the authoritative side sends: the send itself establishes
    /// ground truth, no round trip needed.
    pub fn force(&mut self, stack: &ItemStack) {
        self.known = Known::Stack(stack.clone());
    }

    /// Record a compact token reported by the remote peer.
    pub fn receive(&mut self, hash: HashedStack) {
        self.known = Known::Hashed(hash);
    }

    /// Reconciliation predicate against the authoritative local stack.
    ///
    /// A held hash that matches is promoted to a full copy, so later checks
    /// compare stacks directly instead of re-hashing. Callers must treat this
    /// as potentially mutating.
    pub fn matches(&mut self, local: &ItemStack) -> bool {
        match &self.known {
            Known::Unknown => false,
            Known::Stack(remembered) => remembered.matches(local),
            Known::Hashed(hash) => {
                if hash.matches(local) {
                    self.known = Known::Stack(local.clone());
                    true
                } else {
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdcontainer_core::item::items;

    #[test]
    fn fresh_cell_matches_nothing() {
        let mut cell = RemoteSlot::new();
        assert!(!cell.matches(&ItemStack::EMPTY));
        assert!(!cell.matches(&ItemStack::new(items::STONE, 1)));
    }

    #[test]
    fn forced_copy_matches_exactly() {
        let stack = ItemStack::new(items::APPLE, 5);
        let mut cell = RemoteSlot::new();
        cell.force(&stack);
        assert!(cell.matches(&stack));
        assert!(!cell.matches(&stack.copy_with_count(4)));
    }

    #[test]
    fn matching_hash_is_promoted_to_a_full_copy() {
        let stack = ItemStack::with_metadata(items::IRON_SWORD, 1, vec![3]);
        let mut cell = RemoteSlot::new();
        cell.receive(HashedStack::of(&stack));

        assert!(cell.matches(&stack));
        // Promoted: a second check against the same stack still holds.
        assert!(matches!(cell.known, Known::Stack(_)));
        assert!(cell.matches(&stack));
    }

    #[test]
    fn mismatched_hash_stays_a_hash() {
        let mut cell = RemoteSlot::new();
        cell.receive(HashedStack::of(&ItemStack::new(items::STONE, 10)));

        assert!(!cell.matches(&ItemStack::new(items::STONE, 9)));
        assert!(matches!(cell.known, Known::Hashed(_)));
    }
}
