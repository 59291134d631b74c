//! Server-authoritative container menus.
//!
//! A menu binds slots over shared backing containers, runs the click state
//! machine that mutates them, and diffs observable state once per tick against
//! two independent baselines: local listeners (UI redraw hooks) and the remote
//! peer behind a [`ContainerSynchronizer`]. Remote acks arrive as compact
//! hashed stacks and are reconciled through [`RemoteSlot`].

pub mod chest;
pub mod click;
pub mod data_slot;
pub mod menu;
pub mod player;
pub mod remote_slot;
pub mod slot;
pub mod sync;

pub use chest::{chest_menu, ChestBehavior, CHEST_COLUMNS};
pub use click::{ClickType, QuickcraftKind, QuickcraftStatus};
pub use data_slot::DataSlot;
pub use menu::{
    can_item_quick_replace, ContainerMenu, InertBehavior, MenuBehavior, MenuError,
    SLOT_CLICKED_OUTSIDE, SLOT_NONE, STATE_ID_MASK,
};
pub use player::Player;
pub use remote_slot::RemoteSlot;
pub use slot::{Slot, SlotPolicy};
pub use sync::{ContainerListener, ContainerSynchronizer};
