//! Clock, TTL parsing and secure random identifiers.

pub mod clock;
pub mod random;
pub mod ttl;

pub use clock::{now_epoch, Clock, ManualClock, SystemClock};
pub use random::{generate_jti, random_id};
pub use ttl::parse_ttl;
