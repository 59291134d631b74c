//! The acting player as seen by a menu.

use mdcontainer_core::{ItemStack, SimpleContainer};
use std::cell::RefCell;
use std::rc::Rc;

/// Number of hotbar slots.
pub const HOTBAR_SIZE: usize = 9;

/// Total player inventory cells (9 hotbar + 27 main + 4 armor + 1 offhand).
pub const INVENTORY_SIZE: usize = 41;

/// Inventory cell addressed by swap-click button 40.
pub const OFFHAND_SLOT: usize = 40;

/// A player interacting with a menu.
///
/// Carries the capability checks the click state machine needs (infinite
/// materials gates clone-type actions), a shared handle to the inventory the
/// swap branch indexes by hotbar button, and the drop sink for items leaving
/// the simulation.
pub struct Player {
    name: String,
    infinite_materials: bool,
    inventory: Rc<RefCell<SimpleContainer>>,
    dropped: Vec<ItemStack>,
}

impl Player {
    /// A survival-mode player with an empty inventory.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            infinite_materials: false,
            inventory: Rc::new(RefCell::new(SimpleContainer::new(INVENTORY_SIZE))),
            dropped: Vec::new(),
        }
    }

    /// A creative-mode player (infinite materials).
    pub fn creative(name: impl Into<String>) -> Self {
        Self {
            infinite_materials: true,
            ..Self::new(name)
        }
    }

    /// Player name, for log lines.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether clone-type actions may fabricate items for this player.
    pub fn infinite_materials(&self) -> bool {
        self.infinite_materials
    }

    /// Shared handle to the player inventory.
    pub fn inventory(&self) -> Rc<RefCell<SimpleContainer>> {
        self.inventory.clone()
    }

    /// Drop a stack out of the simulation.
    pub fn drop_item(&mut self, stack: ItemStack) {
        if !stack.is_empty() {
            self.dropped.push(stack);
        }
    }

    /// Everything this player has dropped.
    pub fn dropped(&self) -> &[ItemStack] {
        &self.dropped
    }

    /// Add a stack to the inventory, dropping whatever does not fit.
    pub fn add_or_drop(&mut self, stack: ItemStack) {
        let rest = self.inventory.borrow_mut().add_item(stack);
        self.drop_item(rest);
    }

    /// Total item count held in the inventory.
    pub fn inventory_count(&self) -> u64 {
        self.inventory.borrow().total_count()
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("name", &self.name)
            .field("infinite_materials", &self.infinite_materials)
            .field("inventory_count", &self.inventory_count())
            .field("dropped", &self.dropped.len())
            .finish()
    }
}
