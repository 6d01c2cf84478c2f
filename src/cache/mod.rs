//! Cache coordination subsystem.
//!
//! # Data Flow
//! ```text
//! handler (cache key + forwarding headers)
//!     → coordinator.rs (hit? serve + background refresh : fetch and wait)
//!     → in_flight.rs (one registered fetch per key, waiters share it)
//!     → upstream client (raw bytes)
//!     → avatar.rs (patch data.face, remember last upstream avatar)
//!     → store.rs (replace entry)
//!     → release registration, wake waiters
//! ```
//!
//! # Design Decisions
//! - No expiry: an entry only changes when a refresh overwrites it
//! - Failed fetches leave the previous entry in place
//! - Locks cover single map operations, never an upstream call

pub mod avatar;
pub mod coordinator;
pub mod in_flight;
pub mod store;

pub use avatar::{AvatarPatcher, AvatarSource, PatchError};
pub use coordinator::{CacheService, FetchError};
pub use in_flight::{Completion, FetchGuard, InFlightTable, Registration};
pub use store::{CacheEntry, CacheStore, AVATAR_KEY};
