pub mod identity;
pub mod memory_store;

pub use identity::FixtureIdentityProvider;
pub use memory_store::InMemoryDocumentStore;
