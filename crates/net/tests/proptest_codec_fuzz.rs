//! Fuzz-style property tests for the container sync codec.
//!
//! These tests validate that message decoders handle arbitrary network input
//! gracefully without crashing.

use mdcontainer_core::{HashedStack, ItemStack};
use mdcontainer_menu::ClickType;
use mdcontainer_net::{
    decode_clientbound, decode_serverbound, encode_clientbound, encode_serverbound,
    ClientboundMessage, ServerboundMessage,
};
use proptest::prelude::*;

fn stack_strategy() -> impl Strategy<Value = ItemStack> {
    (
        0u16..32,
        0u32..128,
        prop::option::of(prop::collection::vec(any::<u8>(), 0..32)),
    )
        .prop_map(|(item, count, metadata)| ItemStack {
            item,
            count,
            metadata,
        })
}

proptest! {
    /// Property: Arbitrary bytes don't crash the clientbound decoder
    #[test]
    fn arbitrary_bytes_dont_crash_clientbound(
        random_bytes in prop::collection::vec(any::<u8>(), 0..2000),
    ) {
        let _result = decode_clientbound(&random_bytes);
        // No panic = success
    }

    /// Property: Arbitrary bytes don't crash the serverbound decoder
    #[test]
    fn arbitrary_bytes_dont_crash_serverbound(
        random_bytes in prop::collection::vec(any::<u8>(), 0..2000),
    ) {
        let _result = decode_serverbound(&random_bytes);
        // No panic = success
    }

    /// Property: Slot updates roundtrip
    #[test]
    fn set_slot_roundtrips(
        container_id in any::<u8>(),
        state_id in 0u16..0x8000,
        slot in any::<u16>(),
        stack in stack_strategy(),
    ) {
        let msg = ClientboundMessage::SetSlot { container_id, state_id, slot, stack };
        let encoded = encode_clientbound(&msg).unwrap();
        let decoded = decode_clientbound(&encoded).unwrap();
        prop_assert_eq!(msg, decoded);
    }

    /// Property: Snapshots roundtrip
    #[test]
    fn set_content_roundtrips(
        container_id in any::<u8>(),
        state_id in 0u16..0x8000,
        items in prop::collection::vec(stack_strategy(), 0..64),
        carried in stack_strategy(),
    ) {
        let msg = ClientboundMessage::SetContent { container_id, state_id, items, carried };
        let encoded = encode_clientbound(&msg).unwrap();
        let decoded = decode_clientbound(&encoded).unwrap();
        prop_assert_eq!(msg, decoded);
    }

    /// Property: Click packets roundtrip, hashed acks included
    #[test]
    fn container_click_roundtrips(
        container_id in any::<u8>(),
        state_id in 0u16..0x8000,
        slot in -999i32..256,
        button in any::<u8>(),
        click_raw in 0u8..7,
        acked in prop::collection::vec((any::<u16>(), stack_strategy()), 0..16),
    ) {
        let msg = ServerboundMessage::ContainerClick {
            container_id,
            state_id,
            slot,
            button,
            click: ClickType::try_from(click_raw).unwrap(),
            changed_slots: acked
                .iter()
                .map(|(index, stack)| (*index, HashedStack::of(stack)))
                .collect(),
            carried: HashedStack::Empty,
        };
        let encoded = encode_serverbound(&msg).unwrap();
        let decoded = decode_serverbound(&encoded).unwrap();
        prop_assert_eq!(msg, decoded);
    }
}
