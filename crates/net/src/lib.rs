#![warn(missing_docs)]
//! Wire boundary for container synchronization.
//!
//! Defines the clientbound/serverbound message set, the length-prefixed
//! postcard codec, and the session glue that connects a server-side menu to a
//! message queue and applies inbound packets.

mod codec;
mod protocol;
mod session;

pub use codec::{
    compute_schema_hash, decode_clientbound, decode_serverbound, encode_clientbound,
    encode_serverbound,
};
pub use protocol::{
    ClientboundMessage, ServerboundMessage, MAX_CHANGED_SLOTS, MAX_MENU_SLOTS, MAX_METADATA_LEN,
    PROTOCOL_MAGIC, PROTOCOL_VERSION,
};
pub use session::{apply_clientbound, handle_container_click, Outbox, PacketSynchronizer};
