//! Message encoding and decoding with framing.
//!
//! Provides length-prefixed encoding for reliable delivery over ordered
//! streams. Frame format: `[length: u32][message_type: u8][payload: bytes]`.

use crate::protocol::{ClientboundMessage, ServerboundMessage, PROTOCOL_MAGIC, PROTOCOL_VERSION};
use anyhow::{Context, Result};
use blake3::Hash;

/// Compute schema hash from protocol definitions.
///
/// This hash is used to ensure both peers speak compatible protocol versions.
pub fn compute_schema_hash() -> u64 {
    let mut hasher = blake3::Hasher::new();

    hasher.update(&PROTOCOL_VERSION.to_le_bytes());
    hasher.update(PROTOCOL_MAGIC);

    // Message type names (deterministic)
    hasher.update(b"ClientboundMessage");
    hasher.update(b"ServerboundMessage");
    hasher.update(b"ItemStack");
    hasher.update(b"HashedStack");

    let hash: Hash = hasher.finalize();
    u64::from_le_bytes(hash.as_bytes()[0..8].try_into().expect("hash is 32 bytes"))
}

fn clientbound_type_tag(msg: &ClientboundMessage) -> u8 {
    match msg {
        ClientboundMessage::SetContent { .. } => 0,
        ClientboundMessage::SetSlot { .. } => 1,
        ClientboundMessage::SetData { .. } => 2,
        ClientboundMessage::SetCarried { .. } => 3,
    }
}

fn serverbound_type_tag(msg: &ServerboundMessage) -> u8 {
    match msg {
        ServerboundMessage::ContainerClick { .. } => 0,
        ServerboundMessage::CloseContainer { .. } => 1,
    }
}

fn encode_frame(type_tag: u8, payload: Vec<u8>) -> Vec<u8> {
    let mut frame = Vec::with_capacity(4 + 1 + payload.len());
    let length = (1 + payload.len()) as u32;
    frame.extend_from_slice(&length.to_le_bytes());
    frame.push(type_tag);
    frame.extend_from_slice(&payload);
    frame
}

fn frame_payload(data: &[u8]) -> Result<&[u8]> {
    if data.len() < 5 {
        anyhow::bail!("Frame too short: {} bytes (minimum 5)", data.len());
    }
    let length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if data.len() < 4 + length {
        anyhow::bail!("Incomplete frame: expected {} bytes, got {}", 4 + length, data.len());
    }
    // Skip the message type tag (data[4]).
    Ok(&data[5..4 + length])
}

/// Encode a clientbound message with length prefix.
pub fn encode_clientbound(msg: &ClientboundMessage) -> Result<Vec<u8>> {
    let payload = postcard::to_allocvec(msg).context("Failed to serialize clientbound message")?;
    Ok(encode_frame(clientbound_type_tag(msg), payload))
}

/// Encode a serverbound message with length prefix.
pub fn encode_serverbound(msg: &ServerboundMessage) -> Result<Vec<u8>> {
    let payload = postcard::to_allocvec(msg).context("Failed to serialize serverbound message")?;
    Ok(encode_frame(serverbound_type_tag(msg), payload))
}

/// Decode a clientbound message from frame data and verify its limits.
pub fn decode_clientbound(data: &[u8]) -> Result<ClientboundMessage> {
    let payload = frame_payload(data)?;
    let msg: ClientboundMessage =
        postcard::from_bytes(payload).context("Failed to deserialize clientbound message")?;
    msg.verify().map_err(anyhow::Error::msg)?;
    Ok(msg)
}

/// Decode a serverbound message from frame data and verify its limits.
pub fn decode_serverbound(data: &[u8]) -> Result<ServerboundMessage> {
    let payload = frame_payload(data)?;
    let msg: ServerboundMessage =
        postcard::from_bytes(payload).context("Failed to deserialize serverbound message")?;
    msg.verify().map_err(anyhow::Error::msg)?;
    Ok(msg)
}
