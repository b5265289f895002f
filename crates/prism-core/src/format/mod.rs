//! Structured encodings of whole events.
//!
//! A [`Format`] turns an [`Event`] into one self-contained document and back.
//! Formats are identified by their media type, which is what structured-mode
//! transports advertise as the body's content type.
//!
//! Prism ships the JSON format ([`json()`]); other encodings plug in by
//! implementing [`Format`].

mod json;

use std::fmt::Debug;
use std::sync::{Arc, LazyLock};

use crate::error::BindingResult;
use crate::event::Event;

pub use json::JsonFormat;

/// A structured encoding of events.
pub trait Format: Debug + Send + Sync {
    /// Returns the media type identifying this format (e.g. `application/cloudevents+json`).
    fn media_type(&self) -> &str;

    /// Encodes an event into one document.
    fn marshal(&self, event: &Event) -> BindingResult<Vec<u8>>;

    /// Decodes one document into an event.
    ///
    /// Malformed input fails with [`BindingError::DecodeError`](crate::BindingError::DecodeError).
    fn unmarshal(&self, bytes: &[u8]) -> BindingResult<Event>;
}

/// A shareable format trait object.
pub type BoxedFormat = Arc<dyn Format>;

static JSON: LazyLock<BoxedFormat> = LazyLock::new(|| Arc::new(JsonFormat));

/// Returns the shared JSON format.
pub fn json() -> BoxedFormat {
    Arc::clone(&JSON)
}

/// Finds a built-in format for a content type, ignoring parameters and case.
///
/// Returns `None` when the content type does not denote a structured event,
/// which is how transports tell structured bodies from binary-mode payloads.
pub fn lookup(content_type: &str) -> Option<BoxedFormat> {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    (media_type == JSON.media_type()).then(json)
}
