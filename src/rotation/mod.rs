//! Credential rotation: the policy deciding when to rotate, the slot holding
//! the current client, and the scheduler that ties them together.

pub mod authority;
pub mod policy;
pub mod scheduler;
pub mod slot;

#[cfg(test)]
pub(crate) mod testing;

pub use authority::TokenAuthority;
pub use policy::RotationPolicy;
pub use scheduler::{RefreshScheduler, SchedulerState, TickOutcome, TickReport};
pub use slot::ClientSlot;
