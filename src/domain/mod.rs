//! Domain layer - pure business logic with no infrastructure dependencies.

pub mod foundation;
pub mod order;
pub mod pricing;
pub mod subscription;
pub mod webhook;
