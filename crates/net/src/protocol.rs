//! Protocol message definitions for container synchronization.
//!
//! All messages use postcard serialization for compact binary encoding.

use mdcontainer_core::{HashedStack, ItemStack};
use mdcontainer_menu::ClickType;
use serde::{Deserialize, Serialize};

/// Protocol version for compatibility checking.
pub const PROTOCOL_VERSION: u16 = 1;

/// Protocol magic bytes to identify the container sync protocol.
pub const PROTOCOL_MAGIC: &[u8; 8] = b"MDCT\x00\x01\x00\x00";

/// Maximum number of slots a single menu layout may expose.
///
/// Generous for every vanilla-style screen; prevents DoS through huge
/// snapshot messages.
pub const MAX_MENU_SLOTS: usize = 256;

/// Maximum number of hashed slot acks per click packet.
pub const MAX_CHANGED_SLOTS: usize = 128;

/// Maximum metadata blob length per item stack (bytes).
pub const MAX_METADATA_LEN: usize = 512;

/// Messages sent from the authoritative side to the viewing client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ClientboundMessage {
    /// Full snapshot of a menu: every slot plus the carried stack.
    SetContent {
        /// Window identifier.
        container_id: u8,
        /// State identifier stamped on this snapshot.
        state_id: u16,
        /// Every slot's content, in slot order.
        items: Vec<ItemStack>,
        /// The cursor-held stack.
        carried: ItemStack,
    },

    /// One slot changed.
    SetSlot {
        /// Window identifier.
        container_id: u8,
        /// State identifier stamped on this update.
        state_id: u16,
        /// Menu-wide slot index.
        slot: u16,
        /// New slot content.
        stack: ItemStack,
    },

    /// One tracked scalar changed.
    SetData {
        /// Window identifier.
        container_id: u8,
        /// Data slot index.
        index: u16,
        /// New value.
        value: i32,
    },

    /// The cursor-held stack changed.
    SetCarried {
        /// Window identifier.
        container_id: u8,
        /// State identifier current when the change was sent.
        state_id: u16,
        /// New cursor content.
        stack: ItemStack,
    },
}

impl ClientboundMessage {
    /// Verify message limits and validity.
    ///
    /// This should be called on all received messages to prevent DoS attacks.
    pub fn verify(&self) -> Result<(), &'static str> {
        match self {
            ClientboundMessage::SetContent { items, carried, .. } => {
                if items.len() > MAX_MENU_SLOTS {
                    return Err("Snapshot exceeds slot limit");
                }
                for stack in items.iter().chain(std::iter::once(carried)) {
                    verify_stack(stack)?;
                }
            }
            ClientboundMessage::SetSlot { stack, .. }
            | ClientboundMessage::SetCarried { stack, .. } => {
                verify_stack(stack)?;
            }
            ClientboundMessage::SetData { .. } => {}
        }
        Ok(())
    }
}

/// Messages sent from the viewing client to the authoritative side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ServerboundMessage {
    /// A click, tagged with the state the client believed was current and
    /// hashed echoes of every slot it predicts it changed.
    ContainerClick {
        /// Window identifier.
        container_id: u8,
        /// State identifier the client acted against.
        state_id: u16,
        /// Clicked slot index, or a negative sentinel.
        slot: i32,
        /// Button / gesture byte.
        button: u8,
        /// Click kind.
        click: ClickType,
        /// Hashed post-click beliefs, per touched slot.
        changed_slots: Vec<(u16, HashedStack)>,
        /// Hashed post-click cursor belief.
        carried: HashedStack,
    },

    /// The client closed the window.
    CloseContainer {
        /// Window identifier.
        container_id: u8,
    },
}

impl ServerboundMessage {
    /// Verify message limits and validity.
    pub fn verify(&self) -> Result<(), &'static str> {
        match self {
            ServerboundMessage::ContainerClick { changed_slots, .. } => {
                if changed_slots.len() > MAX_CHANGED_SLOTS {
                    return Err("Too many changed-slot acks");
                }
            }
            ServerboundMessage::CloseContainer { .. } => {}
        }
        Ok(())
    }
}

fn verify_stack(stack: &ItemStack) -> Result<(), &'static str> {
    match &stack.metadata {
        Some(bytes) if bytes.len() > MAX_METADATA_LEN => Err("Item metadata too large"),
        _ => Ok(()),
    }
}
