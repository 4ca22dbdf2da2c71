mod error;
mod keys;
mod serialization;
mod status;
mod tags;
mod traits;

pub use error::{CacheError, Result, TransportError};
pub use keys::{key_for, CacheKey};
pub use serialization::{decode, encode};
pub use status::Status;
pub use tags::{tag_set, Tag, TagSet};
pub use traits::Transport;
