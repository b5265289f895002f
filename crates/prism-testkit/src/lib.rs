//! Test utilities for Prism.
//!
//! - [`min_event`] / [`full_event`] / [`all_events`] - Fixture events
//! - [`MockBinaryMessage`] - Replays an event as a binary-mode message
//! - [`RecordingVisitor`] - Captures binary observations for assertions
//! - [`mock_structured_message`] - JSON-encodes an event
//! - [`TransformerTestArgs`] / [`run_transformer_tests`] - Runs a table of
//!   transformer cases against every message representation
//!
//! ```rust
//! use prism_core::spec::AttributeKind;
//! use prism_core::transformer;
//! use prism_testkit::{TransformerTestArgs, min_event, run_transformer_tests};
//!
//! let mut want = min_event();
//! want.set(AttributeKind::Subject, "sub").unwrap();
//!
//! run_transformer_tests(vec![TransformerTestArgs {
//!     name: "add subject",
//!     input: min_event(),
//!     transformers: vec![transformer::add_attribute(AttributeKind::Subject, "sub")],
//!     want_event: Some(want),
//!     want_error: None,
//! }]);
//! ```

mod fixtures;
mod mock;
mod runner;

pub use fixtures::{
    all_events, binary_payload_event, extension_kinds_event, full_event, min_event,
    min_event_with_version, raw_json_event,
};
pub use mock::{MockBinaryMessage, Observation, RecordingVisitor, mock_structured_message};
pub use runner::{TransformerTestArgs, assert_event_equals, run_transformer_tests};
