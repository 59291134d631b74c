//! Generic chest menu: N container rows above the player inventory.

use crate::menu::{ContainerMenu, MenuBehavior};
use crate::player::Player;
use crate::slot::Slot;
use mdcontainer_core::{Container, ItemStack};
use std::cell::RefCell;
use std::rc::Rc;

/// Chest rows are nine slots wide.
pub const CHEST_COLUMNS: usize = 9;

/// Quick-move routing for a chest screen: chest slots shift into the player
/// inventory (hotbar-first) and player slots shift into the chest.
#[derive(Debug, Clone, Copy)]
pub struct ChestBehavior {
    rows: usize,
}

impl ChestBehavior {
    /// Routing for a chest with the given number of rows.
    pub fn new(rows: usize) -> Self {
        Self { rows }
    }

    fn chest_end(&self) -> usize {
        self.rows * CHEST_COLUMNS
    }
}

impl MenuBehavior for ChestBehavior {
    fn quick_move_stack(
        &self,
        menu: &mut ContainerMenu,
        _player: &mut Player,
        index: usize,
    ) -> ItemStack {
        let slot_count = menu.slot_count();
        let chest_end = self.chest_end();

        let mut current = menu.slot(index).item();
        if current.is_empty() {
            return ItemStack::EMPTY;
        }
        let original = current.clone();

        let moved = if index < chest_end {
            menu.move_item_stack_to(&mut current, chest_end, slot_count, true)
        } else {
            menu.move_item_stack_to(&mut current, 0, chest_end, false)
        };
        if !moved {
            return ItemStack::EMPTY;
        }

        menu.slot(index).set(current);
        original
    }
}

/// Build a chest menu over a shared chest container and the player's
/// inventory: chest slots first, then the 27 main inventory slots, then the
/// hotbar — slot indices in that order.
pub fn chest_menu(
    container_id: u8,
    rows: usize,
    chest: Rc<RefCell<dyn Container>>,
    player: &Player,
) -> ContainerMenu {
    let mut menu = ContainerMenu::new("generic_chest", container_id, Rc::new(ChestBehavior::new(rows)));
    let inventory = player.inventory();

    // Chest grid.
    for row in 0..rows {
        for col in 0..CHEST_COLUMNS {
            let x = 8 + col as i32 * 18;
            let y = 18 + row as i32 * 18;
            menu.add_slot(Slot::new(chest.clone(), row * CHEST_COLUMNS + col, x, y));
        }
    }

    let inventory_y = 32 + rows as i32 * 18;

    // Player main inventory (cells 9..36).
    for row in 0..3 {
        for col in 0..9 {
            let cell = 9 + row * 9 + col;
            let x = 8 + col as i32 * 18;
            let y = inventory_y + row as i32 * 18;
            menu.add_slot(Slot::new(inventory.clone(), cell, x, y));
        }
    }

    // Hotbar (cells 0..9).
    for col in 0..9 {
        let x = 8 + col as i32 * 18;
        let y = inventory_y + 58;
        menu.add_slot(Slot::new(inventory.clone(), col, x, y));
    }

    menu
}
