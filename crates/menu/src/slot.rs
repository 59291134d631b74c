//! Item-holding positions bound to backing container cells.

use crate::player::Player;
use mdcontainer_core::{Container, ItemStack};
use std::cell::RefCell;
use std::rc::Rc;

/// Placement and pickup policy for a slot.
///
/// The predicates are pure: they are evaluated before every candidate
/// mutation and must not have side effects. `on_take` is the one commit hook,
/// fired exactly once per successful physical transfer out of the slot.
pub trait SlotPolicy {
    /// Whether the given stack may be placed into this slot.
    fn may_place(&self, _stack: &ItemStack) -> bool {
        true
    }

    /// Whether the given player may take the contents of this slot.
    fn may_pickup(&self, _player: &Player) -> bool {
        true
    }

    /// Commit hook fired once per successful transfer out of the slot.
    fn on_take(&self, _player: &mut Player, _taken: &ItemStack) {}
}

/// The permissive default policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenSlot;

impl SlotPolicy for OpenSlot {}

/// One item-holding position in a menu.
///
/// The slot's menu-wide `index` is assigned at registration and never reused
/// for a different backing cell while the menu is open. `x`/`y` are
/// display-only screen coordinates.
pub struct Slot {
    container: Rc<RefCell<dyn Container>>,
    container_slot: usize,
    index: usize,
    x: i32,
    y: i32,
    policy: Rc<dyn SlotPolicy>,
}

impl Slot {
    /// Create a slot over a backing container cell with the default policy.
    pub fn new(container: Rc<RefCell<dyn Container>>, container_slot: usize, x: i32, y: i32) -> Self {
        Self::with_policy(container, container_slot, x, y, Rc::new(OpenSlot))
    }

    /// Create a slot with a custom placement/pickup policy.
    pub fn with_policy(
        container: Rc<RefCell<dyn Container>>,
        container_slot: usize,
        x: i32,
        y: i32,
        policy: Rc<dyn SlotPolicy>,
    ) -> Self {
        Self {
            container,
            container_slot,
            index: 0,
            x,
            y,
            policy,
        }
    }

    /// Menu-wide slot index.
    pub fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn assign_index(&mut self, index: usize) {
        self.index = index;
    }

    /// Display x coordinate.
    pub fn x(&self) -> i32 {
        self.x
    }

    /// Display y coordinate.
    pub fn y(&self) -> i32 {
        self.y
    }

    /// Read the backing cell.
    pub fn item(&self) -> ItemStack {
        self.container.borrow().item(self.container_slot).clone()
    }

    /// Whether the backing cell holds anything.
    pub fn has_item(&self) -> bool {
        !self.item().is_empty()
    }

    /// Overwrite the backing cell, marking the container changed.
    pub fn set(&self, stack: ItemStack) {
        self.container.borrow_mut().set_item(self.container_slot, stack);
    }

    /// Mark the backing container changed without writing a cell.
    pub fn set_changed(&self) {
        self.container.borrow_mut().set_changed();
    }

    /// Whether the given stack may be placed here.
    pub fn may_place(&self, stack: &ItemStack) -> bool {
        self.policy.may_place(stack)
            && self
                .container
                .borrow()
                .can_place_item(self.container_slot, stack)
    }

    /// Whether the given player may take from this slot.
    pub fn may_pickup(&self, player: &Player) -> bool {
        let item = self.item();
        self.policy.may_pickup(player)
            && self
                .container
                .borrow()
                .can_take_item(self.container_slot, &item)
    }

    /// Largest count this slot accepts for the given stack.
    pub fn max_stack_size_for(&self, stack: &ItemStack) -> u32 {
        self.container.borrow().max_stack_size().min(stack.max_stack_size())
    }

    /// Whether both pulling from and re-placing into this slot is allowed.
    pub fn allow_modification(&self, player: &Player) -> bool {
        self.may_pickup(player) && self.may_place(&self.item())
    }

    /// Fire the commit hook for a completed transfer out of this slot.
    pub fn on_take(&self, player: &mut Player, taken: &ItemStack) {
        self.policy.on_take(player, taken);
    }

    /// Remove up to `count` items from the backing cell.
    pub fn remove(&self, count: u32) -> ItemStack {
        self.container.borrow_mut().remove_item(self.container_slot, count)
    }

    /// Merge up to `amount` items from `stack` into this slot.
    ///
    /// Capped by the slot/stack limits, by `may_place`, and by the
    /// same-item-same-metadata rule. Returns the unconsumed remainder; never
    /// creates items.
    pub fn safe_insert(&self, mut stack: ItemStack, amount: u32) -> ItemStack {
        if stack.is_empty() || !self.may_place(&stack) {
            return stack;
        }
        let existing = self.item();
        let space = self.max_stack_size_for(&stack).saturating_sub(existing.count);
        let moved = amount.min(stack.count).min(space);
        if moved == 0 {
            return stack;
        }
        if existing.is_empty() {
            self.set(stack.split(moved));
        } else if existing.same_item_same_metadata(&stack) {
            stack.shrink(moved);
            let mut merged = existing;
            merged.grow(moved);
            self.set(merged);
        }
        stack
    }

    /// Merge the whole stack into this slot, returning the remainder.
    pub fn safe_insert_all(&self, stack: ItemStack) -> ItemStack {
        let amount = stack.count;
        self.safe_insert(stack, amount)
    }

    /// Try to pull up to `count` items, bounded by `limit`.
    ///
    /// Returns `None` if `may_pickup` rejects, or if only a partial pull is
    /// requested while modification is disallowed, or if nothing was removed.
    pub fn try_remove(&self, count: u32, limit: u32, player: &Player) -> Option<ItemStack> {
        if !self.may_pickup(player) {
            return None;
        }
        if !self.allow_modification(player) && limit < self.item().count {
            return None;
        }
        let taken = self.remove(count.min(limit));
        if taken.is_empty() {
            return None;
        }
        if self.item().is_empty() {
            self.set(ItemStack::EMPTY);
        }
        Some(taken)
    }

    /// Pull items and fire `on_take` on success.
    pub fn safe_take(&self, count: u32, limit: u32, player: &mut Player) -> ItemStack {
        match self.try_remove(count, limit, player) {
            Some(taken) => {
                self.on_take(player, &taken);
                taken
            }
            None => ItemStack::EMPTY,
        }
    }
}

impl std::fmt::Debug for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot")
            .field("index", &self.index)
            .field("container_slot", &self.container_slot)
            .field("item", &self.item())
            .finish()
    }
}
