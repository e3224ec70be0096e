//! Event sources that decide when the index is rebuilt.
//!
//! - [`change`] coalesces mutation bursts behind a quiet window and guards
//!   against overlapping rescans
//! - [`navigation`] detects conversation switches from the document location
//! - [`timers`] is the virtual-time queue both are driven by

pub mod change;
pub mod navigation;
pub mod timers;

pub use change::{ChangeScheduler, MutationEffect};
pub use navigation::{IdPattern, NavigationDetector, NavigationState, Observation};
pub use timers::{Millis, TimerId, TimerQueue};
