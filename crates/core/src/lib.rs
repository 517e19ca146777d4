#![forbid(unsafe_code)]

pub mod certificate;
pub mod events;
pub mod model;
pub mod progress;
pub mod time;

pub use events::DomainEvent;
pub use progress::{Progress, ProgressChange, compute_progress};
pub use time::Clock;
