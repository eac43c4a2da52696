pub mod credential;
pub mod file;
pub mod memory;
pub mod traits;

pub use credential::{ClientContext, Credential, CredentialStore, CREDENTIAL_KEY};
pub use file::FileKeyValueStore;
pub use memory::MemoryKeyValueStore;
pub use traits::KeyValueStore;
