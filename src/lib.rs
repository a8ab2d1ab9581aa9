//! Dependency-tracking reactivity: observed objects register the
//! subscriber that reads them and notify it on writes, with cleanup on
//! re-run, nested-subscriber stack semantics, a self-trigger guard and
//! pluggable scheduling.
//!
//! Everything hangs off a [`Runtime`] (dependency store +
//! active-subscriber stack + deferred-work queues); construct one per
//! process, or one per test for isolation.

pub mod macros;

mod computed;
mod effect;
mod reactive;
mod refs;
mod runtime;
mod scheduler;
mod store;
mod value;
mod watch;

pub use computed::Computed;
pub use effect::{Effect, EffectOptions};
pub use reactive::Reactive;
pub use refs::Ref;
pub use runtime::Runtime;
pub use scheduler::{Microtask, Rerun, Schedule, SchedulerFn, Sync, Timer};
pub use value::Value;
pub use watch::{Flush, WatchHandle, WatchOptions, WatchSource};
