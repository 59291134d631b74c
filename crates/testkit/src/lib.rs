#![warn(missing_docs)]
//! Deterministic testing surfaces for container sessions: a recording
//! synchronizer, a chest-session fixture, conservation accounting, and a
//! JSONL event sink for headless runs.

use anyhow::Result;
use mdcontainer_core::{Container, ItemStack, SimpleContainer};
use mdcontainer_menu::{chest_menu, ContainerMenu, ContainerSynchronizer, Player};
use serde::Serialize;
use std::cell::RefCell;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

/// One call the menu made into its synchronizer.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncRecord {
    /// Full snapshot push.
    Initial {
        /// State identifier stamped on the snapshot.
        state_id: u16,
        /// All slot contents.
        items: Vec<ItemStack>,
        /// Cursor content.
        carried: ItemStack,
        /// All data values.
        data: Vec<i32>,
    },
    /// Incremental slot update.
    Slot {
        /// State identifier stamped on the update.
        state_id: u16,
        /// Slot index.
        slot: usize,
        /// New content.
        stack: ItemStack,
    },
    /// Incremental data update.
    Data {
        /// Data slot index.
        index: usize,
        /// New value.
        value: i32,
    },
    /// Incremental carried update.
    Carried {
        /// New cursor content.
        stack: ItemStack,
    },
}

/// A synchronizer that appends every send to a shared log.
pub struct RecordingSynchronizer {
    log: Rc<RefCell<Vec<SyncRecord>>>,
}

impl RecordingSynchronizer {
    /// Create a recorder and the log it appends to.
    pub fn new() -> (Self, Rc<RefCell<Vec<SyncRecord>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        (Self { log: log.clone() }, log)
    }
}

impl ContainerSynchronizer for RecordingSynchronizer {
    fn send_initial_data(
        &mut self,
        _container_id: u8,
        state_id: u16,
        items: &[ItemStack],
        carried: &ItemStack,
        data: &[i32],
    ) {
        self.log.borrow_mut().push(SyncRecord::Initial {
            state_id,
            items: items.to_vec(),
            carried: carried.clone(),
            data: data.to_vec(),
        });
    }

    fn send_slot_change(&mut self, _container_id: u8, state_id: u16, slot: usize, stack: &ItemStack) {
        self.log.borrow_mut().push(SyncRecord::Slot {
            state_id,
            slot,
            stack: stack.clone(),
        });
    }

    fn send_data_change(&mut self, _container_id: u8, index: usize, value: i32) {
        self.log.borrow_mut().push(SyncRecord::Data { index, value });
    }

    fn send_carried_change(&mut self, _container_id: u8, _state_id: u16, stack: &ItemStack) {
        self.log.borrow_mut().push(SyncRecord::Carried {
            stack: stack.clone(),
        });
    }
}

/// A chest menu session: the menu, its backing chest, and the player.
pub struct ChestSession {
    /// The server-side menu.
    pub menu: ContainerMenu,
    /// The shared chest container.
    pub chest: Rc<RefCell<SimpleContainer>>,
    /// The interacting player.
    pub player: Player,
}

impl ChestSession {
    /// Build a session over an empty chest with the given number of rows.
    pub fn new(container_id: u8, rows: usize) -> Self {
        let chest = Rc::new(RefCell::new(SimpleContainer::new(rows * 9)));
        let player = Player::new("testkit");
        let menu = chest_menu(container_id, rows, chest.clone(), &player);
        Self { menu, chest, player }
    }

    /// Place a stack directly into a chest cell.
    pub fn fill_chest(&mut self, cell: usize, stack: ItemStack) {
        self.chest.borrow_mut().set_item(cell, stack);
    }

    /// Total items tracked by the session: chest + player inventory +
    /// cursor + drop sink. Conserved by every click except clone-type ones.
    pub fn total_count(&self) -> u64 {
        self.chest.borrow().total_count()
            + self.player.inventory_count()
            + u64::from(self.menu.carried().count)
            + self
                .player
                .dropped()
                .iter()
                .map(|s| u64::from(s.count))
                .sum::<u64>()
    }
}

/// Primary event record captured by headless session runs.
#[derive(Debug, Serialize)]
pub struct EventRecord<'a> {
    /// Session step when the event occurred.
    pub step: u64,
    /// Human-readable kind label.
    pub kind: &'a str,
    /// Free-form payload.
    pub payload: String,
}

/// A sink that writes newline-delimited JSON to disk.
pub struct JsonlSink {
    file: File,
}

impl JsonlSink {
    /// Create a new sink at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self { file })
    }

    /// Append an event to the log.
    pub fn write(&mut self, event: &EventRecord<'_>) -> Result<()> {
        let line = serde_json::to_string(event)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        Ok(())
    }
}
