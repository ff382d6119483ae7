pub mod identity;
pub mod kv;
pub mod store;

pub use identity::UserIdentity;
pub use kv::{JsonFileKv, KvStore, MemoryKv, SharedKv};
pub use store::{storage_key, SubscriptionStore, STORAGE_PREFIX};
