//! The container menu: slot registration, the click state machine, and the
//! per-tick broadcast/diff engine.
//!
//! One menu is owned by one simulation thread. Three parallel views are kept
//! consistent: the live slot contents, the last values reported to local
//! listeners (`last_slots`), and the last values believed to be known by the
//! remote peer (`remote_slots` / `remote_carried` / `remote_data_slots`).

use crate::click::{quickcraft_header, ClickType, QuickcraftKind, QuickcraftStatus};
use crate::data_slot::DataSlot;
use crate::player::{Player, OFFHAND_SLOT};
use crate::remote_slot::RemoteSlot;
use crate::slot::Slot;
use crate::sync::{ContainerListener, ContainerSynchronizer};
use anyhow::Context;
use mdcontainer_core::{Container, ContainerData, HashedStack, ItemStack};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, trace};

/// Sentinel slot index: the click landed outside any slot (drop gesture).
pub const SLOT_CLICKED_OUTSIDE: i32 = -999;

/// Sentinel slot index: no slot.
pub const SLOT_NONE: i32 = -1;

/// State identifiers wrap at 32768.
pub const STATE_ID_MASK: u16 = 0x7fff;

/// Fatal click-path failures. Policy rejections are booleans, never errors;
/// only programming-error-class input reaches this type.
#[derive(Debug, Error)]
pub enum MenuError {
    /// A slot index beyond the menu layout arrived on a fatal path.
    #[error("slot index {index} out of bounds for menu with {len} slots")]
    SlotOutOfBounds {
        /// Offending index as received.
        index: i64,
        /// Current slot count.
        len: usize,
    },
    /// A data index beyond the registered data slots.
    #[error("data index {index} out of bounds for menu with {len} data slots")]
    DataOutOfBounds {
        /// Offending index.
        index: usize,
        /// Current data slot count.
        len: usize,
    },
}

/// Menu-specific routing the core state machine delegates to.
pub trait MenuBehavior {
    /// Route a shift-clicked stack toward its destination range.
    ///
    /// Returns a copy of the stack that was (partially) moved, or empty when
    /// nothing could move. Called in a loop until it reports empty or the
    /// source slot changes item.
    fn quick_move_stack(&self, menu: &mut ContainerMenu, player: &mut Player, index: usize)
        -> ItemStack;

    /// Whether a quick-craft drag may target this slot.
    fn can_drag_to(&self, _menu: &ContainerMenu, _slot: usize) -> bool {
        true
    }

    /// Whether a pickup-all sweep may drain this slot.
    fn can_take_item_for_pick_all(
        &self,
        _menu: &ContainerMenu,
        _carried: &ItemStack,
        _slot: usize,
    ) -> bool {
        true
    }

    /// Whether the menu is still usable by the player (distance checks etc.).
    fn still_valid(&self, _player: &Player) -> bool {
        true
    }
}

/// Behavior with no quick-move routing, for plain menus and fixtures.
#[derive(Debug, Clone, Copy, Default)]
pub struct InertBehavior;

impl MenuBehavior for InertBehavior {
    fn quick_move_stack(
        &self,
        _menu: &mut ContainerMenu,
        _player: &mut Player,
        _index: usize,
    ) -> ItemStack {
        ItemStack::EMPTY
    }
}

/// Whether `stack` could be dropped onto `slot` during a drag or sweep.
pub fn can_item_quick_replace(slot: &Slot, stack: &ItemStack, allow_overflow: bool) -> bool {
    let existing = slot.item();
    if existing.is_empty() {
        return true;
    }
    if !stack.same_item_same_metadata(&existing) {
        return false;
    }
    let projected = existing.count + if allow_overflow { 0 } else { stack.count };
    projected <= stack.max_stack_size()
}

/// A server-authoritative container menu.
pub struct ContainerMenu {
    menu_type: &'static str,
    container_id: u8,
    behavior: Rc<dyn MenuBehavior>,

    slots: Vec<Slot>,
    last_slots: Vec<ItemStack>,
    remote_slots: Vec<RemoteSlot>,

    data_slots: Vec<DataSlot>,
    remote_data_slots: Vec<i32>,

    carried: ItemStack,
    remote_carried: RemoteSlot,

    state_id: u16,
    suppress_remote_updates: bool,

    quickcraft_status: QuickcraftStatus,
    quickcraft_kind: QuickcraftKind,
    quickcraft_slots: Vec<usize>,

    listeners: Vec<Box<dyn ContainerListener>>,
    synchronizer: Option<Box<dyn ContainerSynchronizer>>,
}

impl ContainerMenu {
    /// Create an empty menu. Slots and data slots are registered afterwards,
    /// in layout order.
    pub fn new(menu_type: &'static str, container_id: u8, behavior: Rc<dyn MenuBehavior>) -> Self {
        Self {
            menu_type,
            container_id,
            behavior,
            slots: Vec::new(),
            last_slots: Vec::new(),
            remote_slots: Vec::new(),
            data_slots: Vec::new(),
            remote_data_slots: Vec::new(),
            carried: ItemStack::EMPTY,
            remote_carried: RemoteSlot::new(),
            state_id: 0,
            suppress_remote_updates: false,
            quickcraft_status: QuickcraftStatus::Idle,
            quickcraft_kind: QuickcraftKind::Charitable,
            quickcraft_slots: Vec::new(),
            listeners: Vec::new(),
            synchronizer: None,
        }
    }

    /// Menu type name, for diagnostics.
    pub fn menu_type(&self) -> &'static str {
        self.menu_type
    }

    /// Window identifier carried by every sync message.
    pub fn container_id(&self) -> u8 {
        self.container_id
    }

    /// Number of registered slots.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Access a registered slot.
    pub fn slot(&self, index: usize) -> &Slot {
        &self.slots[index]
    }

    /// Register a slot. Its menu-wide index is assigned here and never reused
    /// for a different backing cell while the menu is open.
    pub fn add_slot(&mut self, mut slot: Slot) -> usize {
        let index = self.slots.len();
        slot.assign_index(index);
        self.slots.push(slot);
        self.last_slots.push(ItemStack::EMPTY);
        let cell = match &self.synchronizer {
            Some(sync) => sync.create_slot(),
            None => RemoteSlot::new(),
        };
        self.remote_slots.push(cell);
        index
    }

    /// Register a scalar observable.
    pub fn add_data_slot(&mut self, data_slot: DataSlot) -> usize {
        let index = self.data_slots.len();
        self.data_slots.push(data_slot);
        self.remote_data_slots.push(0);
        index
    }

    /// Register one data slot per value tracked by `data`.
    pub fn add_data_slots(&mut self, data: Rc<RefCell<dyn ContainerData>>) {
        let count = data.borrow().count();
        for index in 0..count {
            self.add_data_slot(DataSlot::for_container_data(data.clone(), index));
        }
    }

    /// Number of registered data slots.
    pub fn data_slot_count(&self) -> usize {
        self.data_slots.len()
    }

    /// Read a registered data slot's current value.
    pub fn data_value(&self, index: usize) -> i32 {
        self.data_slots[index].get()
    }

    /// The cursor-held stack. Unbounded by slot limits.
    pub fn carried(&self) -> &ItemStack {
        &self.carried
    }

    /// Overwrite the cursor-held stack.
    pub fn set_carried(&mut self, stack: ItemStack) {
        self.carried = stack;
    }

    /// Current state identifier.
    pub fn state_id(&self) -> u16 {
        self.state_id
    }

    /// Advance the state identifier, wrapping at 32768.
    pub fn increment_state_id(&mut self) -> u16 {
        self.state_id = (self.state_id + 1) & STATE_ID_MASK;
        self.state_id
    }

    /// Copies of every slot's current content, in slot order.
    pub fn items(&self) -> Vec<ItemStack> {
        self.slots.iter().map(|slot| slot.item()).collect()
    }

    /// Whether this menu is still usable by the player.
    pub fn still_valid(&self, player: &Player) -> bool {
        self.behavior.still_valid(player)
    }

    // ---- synchronization ----------------------------------------------

    /// Attach the transport toward the remote peer. Every remote-tracking
    /// cell is rebuilt through the synchronizer's factory and a full snapshot
    /// is pushed, since the remote's state is unknown.
    pub fn set_synchronizer(&mut self, synchronizer: Box<dyn ContainerSynchronizer>) {
        self.remote_slots = self
            .slots
            .iter()
            .map(|_| synchronizer.create_slot())
            .collect();
        self.remote_carried = synchronizer.create_slot();
        self.synchronizer = Some(synchronizer);
        self.send_all_data_to_remote();
    }

    /// Register a local observer and bring it up to date.
    pub fn add_listener(&mut self, listener: Box<dyn ContainerListener>) {
        self.listeners.push(listener);
        self.broadcast_changes();
    }

    /// Stop mirroring changes to the remote peer. Local listeners are
    /// unaffected.
    pub fn suppress_remote_updates(&mut self) {
        self.suppress_remote_updates = true;
    }

    /// Resume mirroring changes to the remote peer.
    pub fn resume_remote_updates(&mut self) {
        self.suppress_remote_updates = false;
    }

    /// Diff every observable against both baselines and emit the minimal set
    /// of updates: all slots, then the carried stack, then all data slots.
    pub fn broadcast_changes(&mut self) {
        for index in 0..self.slots.len() {
            let current = self.slots[index].item();
            self.trigger_slot_listeners(index, &current);
            self.synchronize_slot_to_remote(index, &current);
        }
        self.synchronize_carried_to_remote();
        for index in 0..self.data_slots.len() {
            let value = self.data_slots[index].get();
            if self.data_slots[index].check_and_clear_update_flag() {
                self.trigger_data_listeners(index, value);
            }
            self.synchronize_data_slot_to_remote(index, value);
        }
    }

    /// Like [`Self::broadcast_changes`], but the remote side gets an
    /// unconditional full resend. Local listeners are still only notified on
    /// actual change.
    pub fn broadcast_full_state(&mut self) {
        for index in 0..self.slots.len() {
            let current = self.slots[index].item();
            self.trigger_slot_listeners(index, &current);
        }
        for index in 0..self.data_slots.len() {
            let value = self.data_slots[index].get();
            if self.data_slots[index].check_and_clear_update_flag() {
                self.trigger_data_listeners(index, value);
            }
        }
        self.send_all_data_to_remote();
    }

    /// Push a full snapshot to the remote and reset every remote baseline to
    /// the values just sent.
    pub fn send_all_data_to_remote(&mut self) {
        for index in 0..self.slots.len() {
            let current = self.slots[index].item();
            self.remote_slots[index].force(&current);
        }
        let carried = self.carried.clone();
        self.remote_carried.force(&carried);
        for index in 0..self.data_slots.len() {
            self.remote_data_slots[index] = self.data_slots[index].get();
        }

        if self.synchronizer.is_some() {
            let items = self.items();
            let data: Vec<i32> = self.data_slots.iter().map(|slot| slot.get()).collect();
            let state_id = self.increment_state_id();
            let container_id = self.container_id;
            debug!(
                container_id,
                state_id,
                slots = items.len(),
                "pushing full container snapshot"
            );
            if let Some(sync) = self.synchronizer.as_mut() {
                sync.send_initial_data(container_id, state_id, &items, &carried, &data);
            }
        }
    }

    fn trigger_slot_listeners(&mut self, index: usize, current: &ItemStack) {
        if !self.last_slots[index].matches(current) {
            self.last_slots[index] = current.clone();
            for listener in &mut self.listeners {
                listener.slot_changed(self.container_id, index, current);
            }
        }
    }

    fn trigger_data_listeners(&mut self, index: usize, value: i32) {
        for listener in &mut self.listeners {
            listener.data_changed(self.container_id, index, value);
        }
    }

    fn synchronize_slot_to_remote(&mut self, index: usize, current: &ItemStack) {
        if self.suppress_remote_updates {
            return;
        }
        if !self.remote_slots[index].matches(current) {
            self.remote_slots[index].force(current);
            if self.synchronizer.is_some() {
                let state_id = self.increment_state_id();
                let container_id = self.container_id;
                trace!(container_id, state_id, slot = index, "slot diff -> remote");
                if let Some(sync) = self.synchronizer.as_mut() {
                    sync.send_slot_change(container_id, state_id, index, current);
                }
            }
        }
    }

    fn synchronize_carried_to_remote(&mut self) {
        if self.suppress_remote_updates {
            return;
        }
        let carried = self.carried.clone();
        if !self.remote_carried.matches(&carried) {
            self.remote_carried.force(&carried);
            let container_id = self.container_id;
            let state_id = self.state_id;
            if let Some(sync) = self.synchronizer.as_mut() {
                sync.send_carried_change(container_id, state_id, &carried);
            }
        }
    }

    fn synchronize_data_slot_to_remote(&mut self, index: usize, value: i32) {
        if self.suppress_remote_updates {
            return;
        }
        if self.remote_data_slots[index] != value {
            self.remote_data_slots[index] = value;
            let container_id = self.container_id;
            if let Some(sync) = self.synchronizer.as_mut() {
                sync.send_data_change(container_id, index, value);
            }
        }
    }

    // ---- remote acks ---------------------------------------------------

    /// Record the remote peer's hashed echo for a slot. Out-of-range indices
    /// (stale or malicious clients) are logged and ignored.
    pub fn set_remote_slot_unsafe(&mut self, slot: usize, hash: HashedStack) {
        if slot < self.remote_slots.len() {
            self.remote_slots[slot].receive(hash);
        } else {
            debug!(
                slot,
                len = self.remote_slots.len(),
                "ignoring remote ack for out-of-range slot"
            );
        }
    }

    /// Record the remote peer's hashed echo for the carried stack.
    pub fn set_remote_carried(&mut self, hash: HashedStack) {
        self.remote_carried.receive(hash);
    }

    // ---- authoritative bulk apply --------------------------------------

    /// Overwrite one slot from an authoritative snapshot, adopting its state
    /// identifier.
    pub fn set_item(&mut self, slot: usize, state_id: u16, stack: ItemStack) -> Result<(), MenuError> {
        let len = self.slots.len();
        let target = self.slots.get(slot).ok_or(MenuError::SlotOutOfBounds {
            index: slot as i64,
            len,
        })?;
        target.set(stack);
        self.state_id = state_id & STATE_ID_MASK;
        Ok(())
    }

    /// Overwrite every slot and the carried stack from an authoritative
    /// snapshot, adopting its state identifier.
    pub fn initialize_contents(&mut self, state_id: u16, items: Vec<ItemStack>, carried: ItemStack) {
        for (slot, stack) in self.slots.iter().zip(items) {
            slot.set(stack);
        }
        self.carried = carried;
        self.state_id = state_id & STATE_ID_MASK;
    }

    /// Overwrite one tracked value from an authoritative snapshot.
    pub fn set_data(&mut self, index: usize, value: i32) -> Result<(), MenuError> {
        let len = self.data_slots.len();
        let slot = self
            .data_slots
            .get_mut(index)
            .ok_or(MenuError::DataOutOfBounds { index, len })?;
        slot.set(value);
        Ok(())
    }

    // ---- clicks --------------------------------------------------------

    /// The sole player-driven mutation entry point.
    ///
    /// A failure here is fatal to the session: the error carries full click
    /// diagnostics and the click is never retried.
    pub fn clicked(
        &mut self,
        slot_index: i32,
        button: u8,
        click: ClickType,
        player: &mut Player,
    ) -> anyhow::Result<()> {
        self.do_click(slot_index, button, click, player)
            .with_context(|| {
                format!(
                    "container click failed: menu={} id={} slots={} slot={} button={} click={:?}",
                    self.menu_type,
                    self.container_id,
                    self.slots.len(),
                    slot_index,
                    button,
                    click
                )
            })
    }

    fn do_click(
        &mut self,
        slot_index: i32,
        button: u8,
        click: ClickType,
        player: &mut Player,
    ) -> Result<(), MenuError> {
        if click == ClickType::QuickCraft {
            return self.quickcraft_event(slot_index, button, player);
        }
        if self.quickcraft_status != QuickcraftStatus::Idle {
            // Any non-gesture click mid-drag drops the gesture.
            self.reset_quickcraft();
            return Ok(());
        }

        match click {
            ClickType::Pickup | ClickType::QuickMove if button == 0 || button == 1 => {
                if slot_index == SLOT_CLICKED_OUTSIDE {
                    if !self.carried.is_empty() {
                        if button == 0 {
                            let carried = self.carried.take_all();
                            player.drop_item(carried);
                        } else {
                            let one = self.carried.split(1);
                            player.drop_item(one);
                        }
                    }
                    return Ok(());
                }
                let Ok(index) = usize::try_from(slot_index) else {
                    return Ok(());
                };
                let index = self.checked_slot(index)?;
                if click == ClickType::QuickMove {
                    self.quick_move(index, player);
                } else {
                    self.pickup(index, button, player);
                }
                Ok(())
            }
            ClickType::Swap if button < 9 || button as usize == OFFHAND_SLOT => {
                let Ok(index) = usize::try_from(slot_index) else {
                    return Ok(());
                };
                let index = self.checked_slot(index)?;
                self.swap(index, button as usize, player);
                Ok(())
            }
            ClickType::Clone => {
                if !player.infinite_materials() || !self.carried.is_empty() || slot_index < 0 {
                    return Ok(());
                }
                let index = self.checked_slot(slot_index as usize)?;
                if self.slots[index].has_item() {
                    let item = self.slots[index].item();
                    self.carried = item.copy_with_count(item.max_stack_size());
                }
                Ok(())
            }
            ClickType::Throw => {
                if !self.carried.is_empty() || slot_index < 0 {
                    return Ok(());
                }
                let index = self.checked_slot(slot_index as usize)?;
                let amount = if button == 0 {
                    1
                } else {
                    self.slots[index].item().count
                };
                let thrown = self.slots[index].safe_take(amount, u32::MAX, player);
                player.drop_item(thrown);
                Ok(())
            }
            ClickType::PickupAll => {
                if slot_index < 0 {
                    return Ok(());
                }
                let index = self.checked_slot(slot_index as usize)?;
                self.pickup_all(index, button, player);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn checked_slot(&self, index: usize) -> Result<usize, MenuError> {
        if index < self.slots.len() {
            Ok(index)
        } else {
            Err(MenuError::SlotOutOfBounds {
                index: index as i64,
                len: self.slots.len(),
            })
        }
    }

    fn pickup(&mut self, index: usize, button: u8, player: &mut Player) {
        let slot_item = self.slots[index].item();
        if slot_item.is_empty() {
            if !self.carried.is_empty() {
                let carried = self.carried.take_all();
                let amount = if button == 0 { carried.count } else { 1 };
                self.carried = self.slots[index].safe_insert(carried, amount);
            }
        } else if self.slots[index].may_pickup(player) {
            if self.carried.is_empty() {
                let amount = if button == 0 {
                    slot_item.count
                } else {
                    slot_item.count.div_ceil(2)
                };
                if let Some(taken) = self.slots[index].try_remove(amount, u32::MAX, player) {
                    self.slots[index].on_take(player, &taken);
                    self.carried = taken;
                }
            } else if slot_item.same_item_same_metadata(&self.carried) {
                if button == 0 {
                    // Left click with a matching cursor stack gathers the
                    // slot into the cursor, up to the cursor's stack limit.
                    let limit = self
                        .carried
                        .max_stack_size()
                        .saturating_sub(self.carried.count);
                    if let Some(taken) = self.slots[index].try_remove(slot_item.count, limit, player)
                    {
                        self.carried.grow(taken.count);
                        self.slots[index].on_take(player, &taken);
                    }
                } else if self.slots[index].may_place(&self.carried) {
                    // Right click trickles a single item into the slot.
                    let carried = self.carried.take_all();
                    self.carried = self.slots[index].safe_insert(carried, 1);
                }
            } else if self.slots[index].may_place(&self.carried)
                && self.carried.count <= self.slots[index].max_stack_size_for(&self.carried)
            {
                // Incompatible stacks of carryable size: swap them.
                let carried = self.carried.take_all();
                self.slots[index].set(carried);
                self.carried = slot_item;
            }
        }
        self.slots[index].set_changed();
    }

    fn quick_move(&mut self, index: usize, player: &mut Player) {
        if !self.slots[index].may_pickup(player) {
            return;
        }
        let behavior = Rc::clone(&self.behavior);
        let mut moved = behavior.quick_move_stack(self, player, index);
        // Result slots refill; keep routing until the source changes or dries up.
        while !moved.is_empty() && self.slots[index].item().same_item(&moved) {
            moved = behavior.quick_move_stack(self, player, index);
        }
    }

    fn swap(&mut self, index: usize, inventory_slot: usize, player: &mut Player) {
        let inventory = player.inventory();
        let hotbar_item = inventory.borrow().item(inventory_slot).clone();
        let slot_item = self.slots[index].item();
        if hotbar_item.is_empty() && slot_item.is_empty() {
            return;
        }

        if hotbar_item.is_empty() {
            if self.slots[index].may_pickup(player) {
                inventory.borrow_mut().set_item(inventory_slot, slot_item.clone());
                self.slots[index].set(ItemStack::EMPTY);
                self.slots[index].on_take(player, &slot_item);
            }
        } else if slot_item.is_empty() {
            if self.slots[index].may_place(&hotbar_item) {
                let limit = self.slots[index].max_stack_size_for(&hotbar_item);
                if hotbar_item.count > limit {
                    let mut rest = hotbar_item;
                    let placed = rest.split(limit);
                    inventory.borrow_mut().set_item(inventory_slot, rest);
                    self.slots[index].set(placed);
                } else {
                    inventory.borrow_mut().set_item(inventory_slot, ItemStack::EMPTY);
                    self.slots[index].set(hotbar_item);
                }
            }
        } else if self.slots[index].may_pickup(player) && self.slots[index].may_place(&hotbar_item) {
            let limit = self.slots[index].max_stack_size_for(&hotbar_item);
            if hotbar_item.count > limit {
                // Oversized hotbar stack: place what fits, return the
                // displaced stack to the inventory (or drop it).
                let mut rest = hotbar_item;
                let placed = rest.split(limit);
                inventory.borrow_mut().set_item(inventory_slot, rest);
                self.slots[index].set(placed);
                self.slots[index].on_take(player, &slot_item);
                player.add_or_drop(slot_item);
            } else {
                inventory.borrow_mut().set_item(inventory_slot, slot_item.clone());
                self.slots[index].set(hotbar_item);
                self.slots[index].on_take(player, &slot_item);
            }
        }
    }

    fn pickup_all(&mut self, index: usize, button: u8, player: &mut Player) {
        if self.carried.is_empty() {
            return;
        }
        if self.slots[index].has_item() && self.slots[index].may_pickup(player) {
            return;
        }

        let behavior = Rc::clone(&self.behavior);
        let len = self.slots.len() as isize;
        let (start, step): (isize, isize) = if button == 0 { (0, 1) } else { (len - 1, -1) };

        // Pass 0 skips full stacks so partial stacks coalesce first.
        for pass in 0..2 {
            let mut i = start;
            while i >= 0 && i < len && self.carried.count < self.carried.max_stack_size() {
                let candidate = i as usize;
                let item = self.slots[candidate].item();
                if !item.is_empty()
                    && can_item_quick_replace(&self.slots[candidate], &self.carried, true)
                    && self.slots[candidate].may_pickup(player)
                    && behavior.can_take_item_for_pick_all(self, &self.carried, candidate)
                    && (pass != 0 || item.count != item.max_stack_size())
                {
                    let limit = self.carried.max_stack_size() - self.carried.count;
                    let taken = self.slots[candidate].safe_take(item.count, limit, player);
                    self.carried.grow(taken.count);
                }
                i += step;
            }
        }
    }

    // ---- quick-craft gesture -------------------------------------------

    fn quickcraft_event(
        &mut self,
        slot_index: i32,
        button: u8,
        player: &mut Player,
    ) -> Result<(), MenuError> {
        let previous = self.quickcraft_status;
        let Some(next) = QuickcraftStatus::from_header(quickcraft_header(button)) else {
            self.reset_quickcraft();
            return Ok(());
        };

        let continuation = previous == QuickcraftStatus::Started && next == QuickcraftStatus::Ended;
        if !continuation && previous != next {
            self.reset_quickcraft();
            return Ok(());
        }
        if self.carried.is_empty() {
            self.reset_quickcraft();
            return Ok(());
        }

        match next {
            QuickcraftStatus::Idle => {
                // START: select the distribution kind and begin accumulating.
                let Some(kind) = QuickcraftKind::from_button(button) else {
                    self.reset_quickcraft();
                    return Ok(());
                };
                if kind.permitted_for(player) {
                    self.quickcraft_kind = kind;
                    self.quickcraft_status = QuickcraftStatus::Started;
                    self.quickcraft_slots.clear();
                } else {
                    self.reset_quickcraft();
                }
                Ok(())
            }
            QuickcraftStatus::Started => {
                // CONTINUE: admit the targeted slot into the candidate set.
                let Ok(index) = usize::try_from(slot_index) else {
                    return Ok(());
                };
                let index = self.checked_slot(index)?;
                let carried = self.carried.clone();
                let behavior = Rc::clone(&self.behavior);
                if can_item_quick_replace(&self.slots[index], &carried, true)
                    && self.slots[index].may_place(&carried)
                    && (self.quickcraft_kind == QuickcraftKind::Clone
                        || carried.count > self.quickcraft_slots.len() as u32)
                    && behavior.can_drag_to(self, index)
                    && !self.quickcraft_slots.contains(&index)
                {
                    self.quickcraft_slots.push(index);
                }
                Ok(())
            }
            QuickcraftStatus::Ended => {
                let result = self.finish_quickcraft(player);
                self.reset_quickcraft();
                result
            }
        }
    }

    fn finish_quickcraft(&mut self, player: &mut Player) -> Result<(), MenuError> {
        if self.quickcraft_slots.is_empty() {
            return Ok(());
        }
        if self.quickcraft_slots.len() == 1 {
            // One candidate degenerates into an ordinary pickup click.
            let index = self.quickcraft_slots[0] as i32;
            let kind_button = self.quickcraft_kind as u8;
            self.reset_quickcraft();
            return self.do_click(index, kind_button, ClickType::Pickup, player);
        }

        let original = self.carried.clone();
        if original.is_empty() {
            return Ok(());
        }
        let mut remaining = original.count;
        let candidates = std::mem::take(&mut self.quickcraft_slots);
        let candidate_count = candidates.len() as u32;
        let behavior = Rc::clone(&self.behavior);

        for index in candidates {
            let carried = self.carried.clone();
            if can_item_quick_replace(&self.slots[index], &carried, true)
                && self.slots[index].may_place(&carried)
                && (self.quickcraft_kind == QuickcraftKind::Clone
                    || carried.count >= candidate_count)
                && behavior.can_drag_to(self, index)
            {
                let existing = self.slots[index].item().count;
                let limit = original
                    .max_stack_size()
                    .min(self.slots[index].max_stack_size_for(&original));
                let amount = (self.quickcraft_kind.place_count(&original, candidate_count)
                    + existing)
                    .min(limit);
                remaining = remaining.saturating_sub(amount.saturating_sub(existing));
                self.slots[index].set(original.copy_with_count(amount));
            }
        }

        let mut carried = original;
        carried.set_count(remaining);
        self.carried = carried;
        Ok(())
    }

    fn reset_quickcraft(&mut self) {
        self.quickcraft_status = QuickcraftStatus::Idle;
        self.quickcraft_slots.clear();
    }

    // ---- item routing --------------------------------------------------

    /// Route `stack` into `[start, end)`: first merge into compatible
    /// non-full slots (forward or backward scan), then place the remainder
    /// into the first empty compatible slot. Returns whether anything moved.
    pub fn move_item_stack_to(
        &mut self,
        stack: &mut ItemStack,
        start: usize,
        end: usize,
        reverse: bool,
    ) -> bool {
        let mut moved = false;
        let (first, step): (isize, isize) = if reverse {
            (end as isize - 1, -1)
        } else {
            (start as isize, 1)
        };

        if stack.is_stackable() {
            let mut i = first;
            while !stack.is_empty() && i >= start as isize && i < end as isize {
                let index = i as usize;
                let existing = self.slots[index].item();
                if !existing.is_empty() && existing.same_item_same_metadata(stack) {
                    let limit = self.slots[index].max_stack_size_for(&existing);
                    let total = existing.count + stack.count;
                    if total <= limit {
                        stack.set_count(0);
                        let mut merged = existing;
                        merged.set_count(total);
                        self.slots[index].set(merged);
                        moved = true;
                    } else if existing.count < limit {
                        stack.shrink(limit - existing.count);
                        let mut merged = existing;
                        merged.set_count(limit);
                        self.slots[index].set(merged);
                        moved = true;
                    }
                }
                i += step;
            }
        }

        if !stack.is_empty() {
            let mut i = first;
            while i >= start as isize && i < end as isize {
                let index = i as usize;
                if !self.slots[index].has_item() && self.slots[index].may_place(stack) {
                    let limit = self.slots[index].max_stack_size_for(stack);
                    let placed = stack.split(stack.count.min(limit));
                    self.slots[index].set(placed);
                    moved = true;
                    break;
                }
                i += step;
            }
        }

        moved
    }

    // ---- lifecycle -----------------------------------------------------

    /// The menu is closing: hand the carried stack back to the player.
    pub fn removed(&mut self, player: &mut Player) {
        let carried = self.carried.take_all();
        if !carried.is_empty() {
            player.add_or_drop(carried);
        }
    }
}

impl std::fmt::Debug for ContainerMenu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerMenu")
            .field("menu_type", &self.menu_type)
            .field("container_id", &self.container_id)
            .field("slots", &self.slots.len())
            .field("data_slots", &self.data_slots.len())
            .field("carried", &self.carried)
            .field("state_id", &self.state_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdcontainer_core::item::items;
    use mdcontainer_core::{Container, SimpleContainer};

    fn plain_menu(cells: usize) -> (ContainerMenu, Rc<RefCell<SimpleContainer>>) {
        let container = Rc::new(RefCell::new(SimpleContainer::new(cells)));
        let mut menu = ContainerMenu::new("test", 1, Rc::new(InertBehavior));
        for i in 0..cells {
            menu.add_slot(Slot::new(container.clone(), i, 0, 0));
        }
        (menu, container)
    }

    #[test]
    fn slot_indices_are_assigned_in_registration_order() {
        let (menu, _) = plain_menu(4);
        for i in 0..4 {
            assert_eq!(menu.slot(i).index(), i);
        }
    }

    #[test]
    fn state_id_wraps_at_32768() {
        let (mut menu, _) = plain_menu(1);
        for _ in 0..32768 {
            menu.increment_state_id();
        }
        assert_eq!(menu.state_id(), 0);
    }

    #[test]
    fn quickcraft_continue_without_start_resets() {
        let (mut menu, _) = plain_menu(2);
        let mut player = Player::new("alex");
        menu.set_carried(ItemStack::new(items::STONE, 8));

        // CONTINUE header with no prior START.
        menu.clicked(0, crate::click::quickcraft_button(1, QuickcraftKind::Charitable), ClickType::QuickCraft, &mut player)
            .unwrap();
        assert_eq!(menu.quickcraft_status, QuickcraftStatus::Idle);
        assert!(menu.quickcraft_slots.is_empty());
    }

    #[test]
    fn quickcraft_requires_carried_stack() {
        let (mut menu, _) = plain_menu(2);
        let mut player = Player::new("alex");

        menu.clicked(SLOT_NONE, crate::click::quickcraft_button(0, QuickcraftKind::Charitable), ClickType::QuickCraft, &mut player)
            .unwrap();
        assert_eq!(menu.quickcraft_status, QuickcraftStatus::Idle);
    }

    #[test]
    fn quickcraft_clone_rejected_for_survival_player() {
        let (mut menu, _) = plain_menu(2);
        let mut player = Player::new("alex");
        menu.set_carried(ItemStack::new(items::STONE, 8));

        menu.clicked(SLOT_NONE, crate::click::quickcraft_button(0, QuickcraftKind::Clone), ClickType::QuickCraft, &mut player)
            .unwrap();
        assert_eq!(menu.quickcraft_status, QuickcraftStatus::Idle);
    }

    #[test]
    fn ordinary_click_mid_gesture_drops_the_gesture() {
        let (mut menu, container) = plain_menu(3);
        let mut player = Player::new("alex");
        container.borrow_mut().set_item(2, ItemStack::new(items::APPLE, 1));
        menu.set_carried(ItemStack::new(items::STONE, 8));

        menu.clicked(SLOT_NONE, crate::click::quickcraft_button(0, QuickcraftKind::Charitable), ClickType::QuickCraft, &mut player)
            .unwrap();
        menu.clicked(0, crate::click::quickcraft_button(1, QuickcraftKind::Charitable), ClickType::QuickCraft, &mut player)
            .unwrap();
        assert_eq!(menu.quickcraft_slots.len(), 1);

        // A plain pickup mid-gesture resets and performs nothing.
        menu.clicked(2, 0, ClickType::Pickup, &mut player).unwrap();
        assert_eq!(menu.quickcraft_status, QuickcraftStatus::Idle);
        assert!(menu.quickcraft_slots.is_empty());
        assert_eq!(container.borrow().item(2).count, 1);
        assert_eq!(menu.carried().count, 8);
    }

    #[test]
    fn out_of_range_click_is_fatal_with_diagnostics() {
        let (mut menu, _) = plain_menu(2);
        let mut player = Player::new("alex");

        let err = menu.clicked(99, 0, ClickType::Pickup, &mut player).unwrap_err();
        let text = format!("{err:#}");
        assert!(text.contains("menu=test"));
        assert!(text.contains("slot=99"));
        assert!(text.contains("out of bounds"));
    }

    #[test]
    fn negative_slot_clicks_are_ignored() {
        let (mut menu, container) = plain_menu(2);
        let mut player = Player::new("alex");
        container.borrow_mut().set_item(0, ItemStack::new(items::STONE, 5));

        menu.clicked(SLOT_NONE, 0, ClickType::Throw, &mut player).unwrap();
        menu.clicked(SLOT_NONE, 0, ClickType::PickupAll, &mut player).unwrap();
        menu.clicked(SLOT_NONE, 3, ClickType::Clone, &mut player).unwrap();
        assert_eq!(container.borrow().item(0).count, 5);
        assert!(menu.carried().is_empty());
    }

    #[test]
    fn move_item_stack_merges_then_fills() {
        let (mut menu, container) = plain_menu(3);
        container.borrow_mut().set_item(1, ItemStack::new(items::STONE, 60));

        let mut incoming = ItemStack::new(items::STONE, 10);
        let moved = menu.move_item_stack_to(&mut incoming, 0, 3, false);
        assert!(moved);
        assert!(incoming.is_empty());
        assert_eq!(container.borrow().item(1).count, 64);
        assert_eq!(container.borrow().item(0).count, 6);
    }

    #[test]
    fn move_item_stack_backwards_prefers_high_indices() {
        let (mut menu, container) = plain_menu(3);

        let mut incoming = ItemStack::new(items::STONE, 4);
        assert!(menu.move_item_stack_to(&mut incoming, 0, 3, true));
        assert_eq!(container.borrow().item(2).count, 4);
    }

    #[test]
    fn unstackable_items_skip_the_merge_pass() {
        let (mut menu, container) = plain_menu(2);
        container.borrow_mut().set_item(0, ItemStack::new(items::IRON_SWORD, 1));

        let mut incoming = ItemStack::new(items::IRON_SWORD, 1);
        assert!(menu.move_item_stack_to(&mut incoming, 0, 2, false));
        assert_eq!(container.borrow().item(1).count, 1);
    }
}
