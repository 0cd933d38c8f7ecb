#![forbid(unsafe_code)]

//! Shared test doubles for the job execution fabric: an in-memory `Store`,
//! a deterministic `Clock`, a scriptable `Process`, a recording
//! `EventSink`, and an in-memory `TenantQuota`. Mirrors the role
//! `nvisy-test::mock` plays for `nvisy-core`'s provider traits.

pub mod clock;
pub mod events;
pub mod process;
pub mod quota;
pub mod store;

pub use clock::FakeClock;
pub use events::RecordingEventSink;
pub use process::{Script, ScriptedProcess};
pub use quota::InMemoryQuota;
pub use store::InMemoryStore;
