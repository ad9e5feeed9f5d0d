//! Worker agents.
//!
//! - [`DataAgent`] — the only component allowed to call the tool server
//! - [`SupportAgent`] — turns intents and their results into the reply text

mod data;
mod error;
mod support;

pub use data::{
    CustomerId, DataAgent, DataRequest, Priority, Record, UPDATABLE_FIELDS, describe_record,
};
pub use error::{DataError, Result};
pub use support::{CLARIFICATION, SupportAgent};
