//! stockroom_core - pure types shared by the stockroom crates.
//!
//! Nothing in here holds state: cache keys, tags, the entry status machine,
//! the transport contract and the inventory domain model.

pub mod cache;
pub mod inventory;
