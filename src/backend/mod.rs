//! Remote collaborators: the identity backend and the lead store.

pub mod memory;
pub mod supabase;
pub mod traits;

pub use memory::{InMemoryIdentity, InMemoryLeadStore};
pub use supabase::{SupabaseIdentity, SupabaseLeadStore, spawn_refresh_task};
pub use traits::{BackendSession, IdentityBackend, LeadStore, SessionChange};
