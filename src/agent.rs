//! Message handling: routing, conversational replies, typing simulation.

pub mod responder;
pub mod router;
pub mod typing;

pub use responder::{Responder, ResponseOutcome};
pub use router::{Route, Router};
