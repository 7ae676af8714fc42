pub mod clock;
pub mod structs;

pub use clock::{Clock, ManualClock, SystemClock};
pub use structs::{ResultCache, cache_key};
