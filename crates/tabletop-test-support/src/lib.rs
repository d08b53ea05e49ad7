//! Shared test doubles for the Tabletop session engine.

mod clock;
mod identity;
mod logging;
mod loopback;
mod rng;
mod sink;

pub use clock::FixedClock;
pub use identity::StaticIdentity;
pub use logging::init_tracing;
pub use loopback::{Delivery, LoopbackEndpoint, LoopbackHub};
pub use rng::{MockRng, SequenceRng};
pub use sink::RecordingSink;
