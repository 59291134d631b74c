//! Full loop: authoritative menu, wire codec, and a mirroring client menu.

use mdcontainer_core::item::items;
use mdcontainer_core::{Container, HashedStack, ItemStack, SimpleContainer};
use mdcontainer_menu::{chest_menu, ClickType, ContainerMenu, Player, SLOT_CLICKED_OUTSIDE};
use mdcontainer_net::{
    apply_clientbound, decode_clientbound, decode_serverbound, encode_clientbound,
    encode_serverbound, handle_container_click, ClientboundMessage, Outbox, PacketSynchronizer,
    ServerboundMessage,
};
use mdcontainer_testkit::ChestSession;
use std::cell::RefCell;
use std::rc::Rc;

const ROWS: usize = 1;

struct ClientSide {
    menu: ContainerMenu,
    player: Player,
}

fn client_side(container_id: u8) -> ClientSide {
    let chest = Rc::new(RefCell::new(SimpleContainer::new(ROWS * 9)));
    let player = Player::new("viewer");
    let menu = chest_menu(container_id, ROWS, chest, &player);
    ClientSide { menu, player }
}

/// Ship every queued clientbound message through the codec into the client.
fn flush(outbox: &Outbox, client: &mut ClientSide) -> Vec<ClientboundMessage> {
    let mut shipped = Vec::new();
    while let Some(msg) = {
        let mut queue = outbox.borrow_mut();
        queue.pop_front()
    } {
        let bytes = encode_clientbound(&msg).unwrap();
        let decoded = decode_clientbound(&bytes).unwrap();
        apply_clientbound(&mut client.menu, &decoded).unwrap();
        shipped.push(decoded);
    }
    shipped
}

/// Encode, decode, and apply a click packet on the server.
fn deliver_click(
    session: &mut ChestSession,
    packet: &ServerboundMessage,
) -> anyhow::Result<()> {
    let bytes = encode_serverbound(packet).unwrap();
    let decoded = decode_serverbound(&bytes).unwrap();
    handle_container_click(&mut session.menu, &mut session.player, &decoded)
}

#[test]
fn snapshot_reaches_the_client() {
    let mut session = ChestSession::new(7, ROWS);
    session.fill_chest(0, ItemStack::new(items::STONE, 10));
    let mut client = client_side(7);

    let (sync, outbox) = PacketSynchronizer::new();
    session.menu.set_synchronizer(Box::new(sync));
    let shipped = flush(&outbox, &mut client);

    assert!(matches!(shipped[0], ClientboundMessage::SetContent { .. }));
    assert_eq!(client.menu.items(), session.menu.items());
    assert_eq!(client.menu.state_id(), session.menu.state_id());
}

#[test]
fn acked_click_produces_no_resend() {
    let mut session = ChestSession::new(7, ROWS);
    session.fill_chest(0, ItemStack::new(items::STONE, 10));
    let mut client = client_side(7);

    let (sync, outbox) = PacketSynchronizer::new();
    session.menu.set_synchronizer(Box::new(sync));
    flush(&outbox, &mut client);

    // The client predicts the pickup locally, then reports its post-click
    // belief as hashed acks.
    client
        .menu
        .clicked(0, 0, ClickType::Pickup, &mut client.player)
        .unwrap();
    let packet = ServerboundMessage::ContainerClick {
        container_id: 7,
        state_id: client.menu.state_id(),
        slot: 0,
        button: 0,
        click: ClickType::Pickup,
        changed_slots: vec![(0, HashedStack::of(&client.menu.slot(0).item()))],
        carried: HashedStack::of(client.menu.carried()),
    };

    deliver_click(&mut session, &packet).unwrap();

    // The prediction was correct: the hashed acks matched the authoritative
    // outcome and nothing needs resending.
    assert!(outbox.borrow().is_empty());
    assert_eq!(session.menu.carried().count, 10);
    assert!(session.chest.borrow().item(0).is_empty());
}

#[test]
fn mispredicted_click_is_healed_by_a_resend() {
    let mut session = ChestSession::new(7, ROWS);
    session.fill_chest(0, ItemStack::new(items::STONE, 10));
    let mut client = client_side(7);

    let (sync, outbox) = PacketSynchronizer::new();
    session.menu.set_synchronizer(Box::new(sync));
    flush(&outbox, &mut client);

    // The client's belief is wrong: it claims the slot still holds 10.
    let packet = ServerboundMessage::ContainerClick {
        container_id: 7,
        state_id: client.menu.state_id(),
        slot: 0,
        button: 0,
        click: ClickType::Pickup,
        changed_slots: vec![(0, HashedStack::of(&ItemStack::new(items::STONE, 10)))],
        carried: HashedStack::Empty,
    };
    deliver_click(&mut session, &packet).unwrap();

    // The authoritative slot is now empty; the bad ack forces corrections.
    let shipped = flush(&outbox, &mut client);
    assert!(!shipped.is_empty());
    assert_eq!(client.menu.items(), session.menu.items());
    assert_eq!(*client.menu.carried(), *session.menu.carried());
}

#[test]
fn stale_state_click_triggers_a_full_resync() {
    let mut session = ChestSession::new(7, ROWS);
    session.fill_chest(3, ItemStack::new(items::APPLE, 6));
    let mut client = client_side(7);

    let (sync, outbox) = PacketSynchronizer::new();
    session.menu.set_synchronizer(Box::new(sync));
    flush(&outbox, &mut client);

    let stale_state = session.menu.state_id().wrapping_add(5) & 0x7fff;
    let packet = ServerboundMessage::ContainerClick {
        container_id: 7,
        state_id: stale_state,
        slot: 3,
        button: 0,
        click: ClickType::Pickup,
        changed_slots: vec![(3, HashedStack::Empty)],
        carried: HashedStack::of(&ItemStack::new(items::APPLE, 6)),
    };
    deliver_click(&mut session, &packet).unwrap();

    let shipped = flush(&outbox, &mut client);
    assert!(
        shipped
            .iter()
            .any(|msg| matches!(msg, ClientboundMessage::SetContent { .. })),
        "stale click must force a snapshot, got {shipped:?}"
    );
    assert_eq!(client.menu.items(), session.menu.items());
}

#[test]
fn clicks_for_other_containers_are_dropped() {
    let mut session = ChestSession::new(7, ROWS);
    session.fill_chest(0, ItemStack::new(items::STONE, 4));
    let (sync, outbox) = PacketSynchronizer::new();
    session.menu.set_synchronizer(Box::new(sync));
    outbox.borrow_mut().clear();

    let packet = ServerboundMessage::ContainerClick {
        container_id: 9,
        state_id: session.menu.state_id(),
        slot: 0,
        button: 0,
        click: ClickType::Pickup,
        changed_slots: vec![],
        carried: HashedStack::Empty,
    };
    deliver_click(&mut session, &packet).unwrap();

    assert_eq!(session.chest.borrow().item(0).count, 4);
    assert!(outbox.borrow().is_empty());
}

#[test]
fn dropped_carried_stack_converges() {
    let mut session = ChestSession::new(7, ROWS);
    session.fill_chest(0, ItemStack::new(items::STONE, 10));
    let mut client = client_side(7);

    let (sync, outbox) = PacketSynchronizer::new();
    session.menu.set_synchronizer(Box::new(sync));
    flush(&outbox, &mut client);

    // Pick up, then throw everything out of the window; the client predicts
    // both actions and acks them.
    for (slot, changed, carried_after) in [
        (0, HashedStack::Empty, HashedStack::of(&ItemStack::new(items::STONE, 10))),
        (SLOT_CLICKED_OUTSIDE, HashedStack::Empty, HashedStack::Empty),
    ] {
        client
            .menu
            .clicked(slot, 0, ClickType::Pickup, &mut client.player)
            .unwrap();
        let packet = ServerboundMessage::ContainerClick {
            container_id: 7,
            state_id: client.menu.state_id(),
            slot,
            button: 0,
            click: ClickType::Pickup,
            changed_slots: vec![(0, changed)],
            carried: carried_after,
        };
        deliver_click(&mut session, &packet).unwrap();
        flush(&outbox, &mut client);
    }

    assert!(session.menu.carried().is_empty());
    assert_eq!(session.player.dropped().len(), 1);
    assert_eq!(session.player.dropped()[0].count, 10);
    assert_eq!(client.menu.items(), session.menu.items());
}
