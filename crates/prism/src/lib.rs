//! # Prism
//!
//! Move event envelopes between structured, binary and decoded form without
//! caring which one you hold.
//!
//! ## Overview
//!
//! An event arrives in whatever shape its transport produced: a JSON
//! document, a set of protocol headers plus a body, or an event built in
//! code. Prism wraps all three in one [`Message`](prelude::Message) and lets
//! transformers edit the metadata on whichever path is cheapest.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐     ┌──────────────────────────────┐     ┌───────────┐
//! │ Transport │────▶│ Pipeline                     │────▶│   Sink    │
//! │ (Message) │     │ add_attribute ▶ add_extension│     │ (Message) │
//! └───────────┘     └──────────────────────────────┘     └───────────┘
//! ```
//!
//! - **Core** ([`core`]): attribute registry, event model, messages and
//!   transformers
//! - **Runtime** ([`runtime`]): configuration, logging and named pipelines
//!
//! ## Quick Start
//!
//! ```rust
//! use prism::prelude::*;
//!
//! let event = Event::builder()
//!     .id("aaa")
//!     .source("https://example.com/orders")
//!     .ty("com.example.order.created")
//!     .build()
//!     .unwrap();
//!
//! let transformers = Transformers::new()
//!     .with(transformer::add_attribute(AttributeKind::Subject, "orders"))
//!     .with(transformer::add_extension("tenant", "acme"));
//!
//! let event = transformers
//!     .apply(Message::from(event))
//!     .and_then(Message::into_event)
//!     .unwrap();
//! assert_eq!(event.subject(), Some("orders"));
//! ```
//!
//! ## Features
//!
//! - `runtime`: Configuration-driven pipelines and logging (default)
//! - `toml-config`: Load TOML configuration files (default)
//! - `yaml-config`: Load YAML configuration files
//! - `json-log`: JSON log output

pub use prism_core as core;
#[cfg(feature = "runtime")]
pub use prism_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust
/// use prism::prelude::*;
/// ```
pub mod prelude {
    // Messages and events
    pub use prism_core::{
        BinaryMessage, BinaryVisitor, Encoding, Event, EventBuilder, Message, StructuredMessage,
        Value,
    };

    // Attribute registry
    pub use prism_core::{AttributeKind, SpecVersion};

    // Transformers
    pub use prism_core::transformer;
    pub use prism_core::{BoxedTransformer, Transformer, Transformers};

    // Errors
    pub use prism_core::{BindingError, BindingResult};

    // Runtime - config-driven entry point
    #[cfg(feature = "runtime")]
    pub use prism_runtime::{Pipeline, PrismConfig, PrismRuntime};
}
