//! Foundation module - shared value objects, identifiers, and domain primitives.

mod auth;
mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use auth::{normalize_contact, AuthError, AuthenticatedUser};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{OrderId, UserId};
pub use state_machine::{StateMachine, Transition};
pub use timestamp::Timestamp;
