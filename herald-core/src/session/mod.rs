//! Live push sessions.
//!
//! A session pairs a user id with one open [`PushChannel`]. The
//! [`SessionRegistry`] holds at most one channel per user; registering again
//! for the same user replaces the previous entry and hands the superseded
//! channel back to the caller, which is responsible for closing it.
//!
//! ```text
//!   channel-open task                    delivery tasks
//!         │                                   │
//!         │ register / lease                  │ lookup / snapshot
//!         ▼                                   ▼
//!   ┌──────────────────────────────────────────────────┐
//!   │   SessionRegistry (DashMap<user_id, channel>)    │
//!   └──────────────────────────────────────────────────┘
//!         ▲
//!         │ SessionLease::drop -> release(user_id, channel_id)
//! ```

mod channel;
mod registry;

pub use channel::{ChannelError, ChannelId, ChannelReceiver, PushChannel, QueuedChannel};
pub use registry::{ChannelHandle, SessionLease, SessionRegistry};
