//! # Prism Core
//!
//! Representation-agnostic event messages and the transformers that edit
//! their metadata.
//!
//! An event travels through a pipeline in one of three representations:
//! a structured document, a stream of binary-mode attribute observations, or
//! a decoded in-memory [`Event`]. Prism Core lets producers, transformers and
//! sinks work with any of them through one [`Message`] type, converting only
//! when a consumer actually needs another representation.
//!
//! ## Building Blocks
//!
//! - **Spec registry** ([`spec`]): versioned attribute catalogs
//!   ([`SpecVersion`], [`AttributeSpec`], [`Versions`])
//! - **Event model** ([`event`]): typed [`Value`]s, versioned [`Context`],
//!   [`Event`] and [`EventBuilder`]
//! - **Formats** ([`format`]): structured encodings, JSON built in
//! - **Messages** ([`message`]): [`Message`] and its readers and writers
//! - **Transformers** ([`transformer`]): metadata edits applied on the
//!   cheapest path available
//!
//! ## Transformation Paths
//!
//! ```text
//!  Message::Event ──────────────▶ mutate in place ───────────▶ Message::Event
//!  Message::Structured ──decode─▶ mutate in place ───────────▶ Message::Event
//!  Message::Binary ─────────────▶ wrap reader in interceptor ▶ Message::Binary
//! ```
//!
//! ## Example
//!
//! ```rust
//! use prism_core::prelude::*;
//!
//! let event = Event::builder()
//!     .id("aaa")
//!     .source("https://example.com/sensors")
//!     .ty("com.example.reading")
//!     .build()
//!     .unwrap();
//!
//! let transformers = Transformers::new()
//!     .with(transformer::add_attribute(AttributeKind::Subject, "temperature"))
//!     .with(transformer::add_extension("site", "lab"));
//!
//! let message = transformers.apply(Message::from(event)).unwrap();
//! let event = message.into_event().unwrap();
//! assert_eq!(event.subject(), Some("temperature"));
//! ```

pub mod error;
pub mod event;
pub mod format;
pub mod message;
pub mod spec;
pub mod transformer;

pub use error::{BindingError, BindingResult};
pub use event::{Context, Event, EventBuilder, Value, ValueKind};
pub use format::{BoxedFormat, Format, JsonFormat};
pub use message::{
    BinaryMessage, BinaryReader, BinaryVisitor, Encoding, EventMessage, EventWriter, Message,
    StructuredMessage,
};
pub use spec::{AttributeKind, AttributeSpec, SpecVersion, Version, Versions};
pub use transformer::{BoxedTransformer, Transformer, Transformers};

/// Prelude for common imports.
pub mod prelude {
    pub use super::transformer;
    pub use super::{
        AttributeKind, BinaryMessage, BinaryVisitor, BindingError, BindingResult, BoxedTransformer,
        Encoding, Event, EventBuilder, Message, SpecVersion, StructuredMessage, Transformer,
        Transformers, Value,
    };
}
