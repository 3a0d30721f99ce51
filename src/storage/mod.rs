mod assets;
mod kv_store;

pub use assets::AssetStore;
pub use kv_store::{KvStore, StorageError, DECKS_KEY};
