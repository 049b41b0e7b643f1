//! Domain layer - Pure types and rules, no I/O.

pub mod email;
pub mod foundation;
pub mod lenient_json;
pub mod quiz;
pub mod readiness;
pub mod response;
pub mod risk;
pub mod session;
pub mod validation;
