//! Membership store implementations

mod in_memory;
mod postgres;

pub use in_memory::InMemoryMembershipStore;
pub use postgres::PostgresMembershipStore;
