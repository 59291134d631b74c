//! Compact stack tokens for remote acknowledgements.
//!
//! A client echoing every full stack it believes it holds would be wasteful;
//! instead it sends the item id, the count, and a crc32 over the metadata
//! bytes. Comparing a token against a live stack is cheap, and a confirmed
//! match is promoted to a full copy by the caller so later comparisons skip
//! the hash entirely.

use crate::item::{ItemId, ItemStack};
use serde::{Deserialize, Serialize};

/// Compact token describing a stack as observed by the remote peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashedStack {
    /// The remote observed an empty cell.
    Empty,
    /// The remote observed an occupied cell.
    Item {
        /// Item type identifier.
        item: ItemId,
        /// Stack count.
        count: u32,
        /// crc32 over the metadata bytes (tagged for presence).
        metadata_crc: u32,
    },
}

impl HashedStack {
    /// Compute the token for a live stack.
    pub fn of(stack: &ItemStack) -> Self {
        if stack.is_empty() {
            return HashedStack::Empty;
        }
        HashedStack::Item {
            item: stack.item,
            count: stack.count,
            metadata_crc: metadata_crc(stack.metadata.as_deref()),
        }
    }

    /// Whether this token describes the given live stack.
    pub fn matches(&self, stack: &ItemStack) -> bool {
        match *self {
            HashedStack::Empty => stack.is_empty(),
            HashedStack::Item {
                item,
                count,
                metadata_crc: crc,
            } => {
                !stack.is_empty()
                    && stack.item == item
                    && stack.count == count
                    && metadata_crc(stack.metadata.as_deref()) == crc
            }
        }
    }
}

/// Hash metadata bytes, distinguishing "absent" from "empty".
fn metadata_crc(metadata: Option<&[u8]>) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    match metadata {
        None => hasher.update(&[0]),
        Some(bytes) => {
            hasher.update(&[1]);
            hasher.update(bytes);
        }
    }
    hasher.finalize()
}
