//! Click kinds and quick-craft gesture encoding.
//!
//! Quick-craft events pack two fields into the button byte: the gesture
//! header in bits 2-3 (start / continue / end) and the distribution kind in
//! bits 0-1.

use crate::player::Player;
use mdcontainer_core::ItemStack;
use serde::{Deserialize, Serialize};

/// Kind of click gesture arriving from the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ClickType {
    /// Plain left/right click on a slot (or outside the window).
    Pickup = 0,
    /// Shift-click auto-transfer.
    QuickMove = 1,
    /// Swap the slot with a hotbar cell (or the offhand).
    Swap = 2,
    /// Creative middle-click: fabricate a full stack.
    Clone = 3,
    /// Drop items from a slot out of the window.
    Throw = 4,
    /// Drag-distribution gesture event.
    QuickCraft = 5,
    /// Double-click: gather matching items onto the cursor.
    PickupAll = 6,
}

impl TryFrom<u8> for ClickType {
    type Error = anyhow::Error;

    fn try_from(value: u8) -> anyhow::Result<Self> {
        match value {
            0 => Ok(ClickType::Pickup),
            1 => Ok(ClickType::QuickMove),
            2 => Ok(ClickType::Swap),
            3 => Ok(ClickType::Clone),
            4 => Ok(ClickType::Throw),
            5 => Ok(ClickType::QuickCraft),
            6 => Ok(ClickType::PickupAll),
            _ => Err(anyhow::anyhow!("Invalid click type: {}", value)),
        }
    }
}

/// Quick-craft gesture phase. The header bits of a gesture event name the
/// phase the sender wants to be in, which doubles as the stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuickcraftStatus {
    /// No gesture active.
    #[default]
    Idle,
    /// Candidate slots are being accumulated.
    Started,
    /// Distribution requested.
    Ended,
}

impl QuickcraftStatus {
    /// Decode the phase named by a gesture header, if well-formed.
    pub fn from_header(header: u8) -> Option<Self> {
        match header {
            0 => Some(QuickcraftStatus::Idle),
            1 => Some(QuickcraftStatus::Started),
            2 => Some(QuickcraftStatus::Ended),
            _ => None,
        }
    }
}

/// Distribution algorithm selected when a quick-craft gesture starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuickcraftKind {
    /// Spread the carried stack evenly: `floor(count / slots)` each.
    #[default]
    Charitable = 0,
    /// One item per slot.
    Greedy = 1,
    /// A full stack per slot, fabricated; needs infinite materials.
    Clone = 2,
}

impl QuickcraftKind {
    /// Decode the kind bits of a gesture button, if well-formed.
    pub fn from_button(button: u8) -> Option<Self> {
        match button & 3 {
            0 => Some(QuickcraftKind::Charitable),
            1 => Some(QuickcraftKind::Greedy),
            2 => Some(QuickcraftKind::Clone),
            _ => None,
        }
    }

    /// Whether the requesting player may use this distribution kind.
    pub fn permitted_for(self, player: &Player) -> bool {
        match self {
            QuickcraftKind::Charitable | QuickcraftKind::Greedy => true,
            QuickcraftKind::Clone => player.infinite_materials(),
        }
    }

    /// Items placed per candidate slot before the existing-count top-up.
    pub fn place_count(self, carried: &ItemStack, candidate_slots: u32) -> u32 {
        match self {
            QuickcraftKind::Charitable => carried.count / candidate_slots.max(1),
            QuickcraftKind::Greedy => 1,
            QuickcraftKind::Clone => carried.max_stack_size(),
        }
    }
}

/// Gesture phase bits of a quick-craft button.
pub fn quickcraft_header(button: u8) -> u8 {
    (button >> 2) & 3
}

/// Pack a gesture button from header and kind.
pub fn quickcraft_button(header: u8, kind: QuickcraftKind) -> u8 {
    (header << 2) | kind as u8
}
