//! Boundary traits: local listeners and the remote synchronizer.

use crate::remote_slot::RemoteSlot;
use mdcontainer_core::ItemStack;

/// Local observer of menu state (UI redraw hooks, achievements glue).
///
/// Notified from `broadcast_changes` whenever a value differs from the last
/// locally reported one. Independent of the remote track: suppressing remote
/// updates never suppresses listener notifications.
pub trait ContainerListener {
    /// A slot's content changed since the last local broadcast.
    fn slot_changed(&mut self, container_id: u8, slot: usize, stack: &ItemStack);

    /// A data slot's value changed since the last local broadcast.
    fn data_changed(&mut self, container_id: u8, index: usize, value: i32);
}

/// The transport toward the remote peer.
///
/// Implementations decide how updates travel (packets, queues, test
/// recorders). The menu calls these from `broadcast_changes` and
/// `send_all_data_to_remote`; every payload is already a defensive copy.
pub trait ContainerSynchronizer {
    /// Factory for a fresh remote-tracking cell, called once per slot (plus
    /// one for the carried stack) when this synchronizer attaches.
    fn create_slot(&self) -> RemoteSlot {
        RemoteSlot::new()
    }

    /// Full-state push: every slot, the carried stack, every data value.
    fn send_initial_data(
        &mut self,
        container_id: u8,
        state_id: u16,
        items: &[ItemStack],
        carried: &ItemStack,
        data: &[i32],
    );

    /// Incremental push: one slot changed.
    fn send_slot_change(&mut self, container_id: u8, state_id: u16, slot: usize, stack: &ItemStack);

    /// Incremental push: one data value changed.
    fn send_data_change(&mut self, container_id: u8, index: usize, value: i32);

    /// Incremental push: the carried stack changed.
    fn send_carried_change(&mut self, container_id: u8, state_id: u16, stack: &ItemStack);
}
