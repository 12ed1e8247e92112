//! `engine` crate: input resolution, request assembly, and the dispatcher.

pub mod models;
pub mod error;
pub mod payload;
pub mod dispatcher;

pub use models::{parse_bool_input, ActionOutputs, InvocationInputs, Outcome, ResolvedInputs};
pub use error::DispatchError;
pub use payload::build_request;
pub use dispatcher::{report, Dispatcher};

#[cfg(test)]
mod dispatcher_tests;
