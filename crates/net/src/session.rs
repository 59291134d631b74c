//! Session glue between a menu and the wire.
//!
//! The server side attaches a [`PacketSynchronizer`] to its menu and drains
//! the outbox into its transport; inbound click packets go through
//! [`handle_container_click`]. The client side applies clientbound messages
//! to its mirror menu with [`apply_clientbound`].

use crate::protocol::{ClientboundMessage, ServerboundMessage};
use anyhow::Result;
use mdcontainer_core::ItemStack;
use mdcontainer_menu::{ContainerMenu, ContainerSynchronizer, Player};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{debug, trace};

/// Shared queue of clientbound messages awaiting transmission.
pub type Outbox = Rc<RefCell<VecDeque<ClientboundMessage>>>;

/// A [`ContainerSynchronizer`] that queues wire messages into an [`Outbox`].
pub struct PacketSynchronizer {
    outbox: Outbox,
}

impl PacketSynchronizer {
    /// Create a synchronizer and the outbox it feeds.
    pub fn new() -> (Self, Outbox) {
        let outbox: Outbox = Rc::new(RefCell::new(VecDeque::new()));
        (
            Self {
                outbox: outbox.clone(),
            },
            outbox,
        )
    }
}

impl ContainerSynchronizer for PacketSynchronizer {
    fn send_initial_data(
        &mut self,
        container_id: u8,
        state_id: u16,
        items: &[ItemStack],
        carried: &ItemStack,
        data: &[i32],
    ) {
        trace!(container_id, state_id, slots = items.len(), "queueing snapshot");
        self.outbox.borrow_mut().push_back(ClientboundMessage::SetContent {
            container_id,
            state_id,
            items: items.to_vec(),
            carried: carried.clone(),
        });
        for (index, value) in data.iter().enumerate() {
            self.outbox.borrow_mut().push_back(ClientboundMessage::SetData {
                container_id,
                index: index as u16,
                value: *value,
            });
        }
    }

    fn send_slot_change(&mut self, container_id: u8, state_id: u16, slot: usize, stack: &ItemStack) {
        self.outbox.borrow_mut().push_back(ClientboundMessage::SetSlot {
            container_id,
            state_id,
            slot: slot as u16,
            stack: stack.clone(),
        });
    }

    fn send_data_change(&mut self, container_id: u8, index: usize, value: i32) {
        self.outbox.borrow_mut().push_back(ClientboundMessage::SetData {
            container_id,
            index: index as u16,
            value,
        });
    }

    fn send_carried_change(&mut self, container_id: u8, state_id: u16, stack: &ItemStack) {
        self.outbox.borrow_mut().push_back(ClientboundMessage::SetCarried {
            container_id,
            state_id,
            stack: stack.clone(),
        });
    }
}

/// Apply a client's click packet to the authoritative menu.
///
/// The hashed acks update the remote baselines first (they describe the
/// client's post-click belief), remote updates are suppressed while the click
/// itself runs, and the follow-up broadcast heals every divergence. A packet
/// tagged with a stale state identifier still runs, but gets a full resync
/// instead of an incremental diff.
pub fn handle_container_click(
    menu: &mut ContainerMenu,
    player: &mut Player,
    packet: &ServerboundMessage,
) -> Result<()> {
    let ServerboundMessage::ContainerClick {
        container_id,
        state_id,
        slot,
        button,
        click,
        changed_slots,
        carried,
    } = packet
    else {
        return Ok(());
    };

    if *container_id != menu.container_id() {
        debug!(
            got = container_id,
            expected = menu.container_id(),
            "dropping click for another container"
        );
        return Ok(());
    }

    let stale = *state_id != menu.state_id();
    menu.suppress_remote_updates();
    for (ack_slot, hash) in changed_slots {
        menu.set_remote_slot_unsafe(*ack_slot as usize, *hash);
    }
    menu.set_remote_carried(*carried);
    let result = menu.clicked(*slot, *button, *click, player);
    menu.resume_remote_updates();
    result?;

    if stale {
        debug!(
            container_id,
            packet_state = state_id,
            menu_state = menu.state_id(),
            "stale click state, forcing full resync"
        );
        menu.broadcast_full_state();
    } else {
        menu.broadcast_changes();
    }
    Ok(())
}

/// Apply a clientbound message to the viewing side's mirror menu.
pub fn apply_clientbound(menu: &mut ContainerMenu, msg: &ClientboundMessage) -> Result<()> {
    if msg_container_id(msg) != menu.container_id() {
        debug!(
            got = msg_container_id(msg),
            expected = menu.container_id(),
            "dropping update for another container"
        );
        return Ok(());
    }
    match msg {
        ClientboundMessage::SetContent {
            state_id,
            items,
            carried,
            ..
        } => {
            menu.initialize_contents(*state_id, items.clone(), carried.clone());
        }
        ClientboundMessage::SetSlot {
            state_id,
            slot,
            stack,
            ..
        } => {
            menu.set_item(*slot as usize, *state_id, stack.clone())?;
        }
        ClientboundMessage::SetData { index, value, .. } => {
            menu.set_data(*index as usize, *value)?;
        }
        ClientboundMessage::SetCarried { stack, .. } => {
            menu.set_carried(stack.clone());
        }
    }
    Ok(())
}

fn msg_container_id(msg: &ClientboundMessage) -> u8 {
    match msg {
        ClientboundMessage::SetContent { container_id, .. }
        | ClientboundMessage::SetSlot { container_id, .. }
        | ClientboundMessage::SetData { container_id, .. }
        | ClientboundMessage::SetCarried { container_id, .. } => *container_id,
    }
}
