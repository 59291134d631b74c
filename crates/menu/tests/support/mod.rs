//! Shared fixtures for menu integration tests.
#![allow(dead_code)] // not every test binary uses every fixture

use mdcontainer_core::{ItemStack, SimpleContainer};
use mdcontainer_menu::{ContainerMenu, ContainerSynchronizer, InertBehavior, Player, Slot};
use std::cell::RefCell;
use std::rc::Rc;

/// Everything a synchronizer was asked to send, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Initial {
        state_id: u16,
        items: Vec<ItemStack>,
        carried: ItemStack,
        data: Vec<i32>,
    },
    Slot {
        state_id: u16,
        slot: usize,
        stack: ItemStack,
    },
    Data {
        index: usize,
        value: i32,
    },
    Carried {
        stack: ItemStack,
    },
}

struct RecordingSync {
    log: Rc<RefCell<Vec<SyncEvent>>>,
}

impl ContainerSynchronizer for RecordingSync {
    fn send_initial_data(
        &mut self,
        _container_id: u8,
        state_id: u16,
        items: &[ItemStack],
        carried: &ItemStack,
        data: &[i32],
    ) {
        self.log.borrow_mut().push(SyncEvent::Initial {
            state_id,
            items: items.to_vec(),
            carried: carried.clone(),
            data: data.to_vec(),
        });
    }

    fn send_slot_change(&mut self, _container_id: u8, state_id: u16, slot: usize, stack: &ItemStack) {
        self.log.borrow_mut().push(SyncEvent::Slot {
            state_id,
            slot,
            stack: stack.clone(),
        });
    }

    fn send_data_change(&mut self, _container_id: u8, index: usize, value: i32) {
        self.log.borrow_mut().push(SyncEvent::Data { index, value });
    }

    fn send_carried_change(&mut self, _container_id: u8, _state_id: u16, stack: &ItemStack) {
        self.log.borrow_mut().push(SyncEvent::Carried {
            stack: stack.clone(),
        });
    }
}

/// A synchronizer that appends every send to a shared log.
pub fn recording_sync() -> (Box<dyn ContainerSynchronizer>, Rc<RefCell<Vec<SyncEvent>>>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    (Box::new(RecordingSync { log: log.clone() }), log)
}

/// A menu of `cells` open slots over one shared container, no routing.
pub fn plain_menu(cells: usize) -> (ContainerMenu, Rc<RefCell<SimpleContainer>>) {
    let container = Rc::new(RefCell::new(SimpleContainer::new(cells)));
    let mut menu = ContainerMenu::new("test", 1, Rc::new(InertBehavior));
    for i in 0..cells {
        menu.add_slot(Slot::new(container.clone(), i, 0, 0));
    }
    (menu, container)
}

/// Total items tracked by a session: menu container + player inventory +
/// cursor + everything dropped out of the simulation.
pub fn total_count(
    menu: &ContainerMenu,
    container: &Rc<RefCell<SimpleContainer>>,
    player: &Player,
) -> u64 {
    container.borrow().total_count()
        + player.inventory_count()
        + u64::from(menu.carried().count)
        + player.dropped().iter().map(|s| u64::from(s.count)).sum::<u64>()
}
