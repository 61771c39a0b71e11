//! Parse event receivers.
//!
//! Parsing is push-style: the parser walks the stream and hands each piece to
//! a receiver. At every handoff point (version, header, vertex section,
//! attribute, triangles, metadata) the receiver answers with a [`Receive`]:
//! either it declines, and the parser skips that part, or it accepts and
//! returns the handler for the next level down. Handlers are usually the
//! receiver itself (`Receive::Accepted(self)`).

use crate::error::{ParseError, ParseWarning};
use crate::model::{Attribute, FormatVersion, Header, SchemaIdentifier};

/// A receiver's answer at a handoff point.
#[derive(Debug)]
pub enum Receive<T> {
    /// Skip this part of the stream.
    Declined,
    /// Deliver this part of the stream to the given handler.
    Accepted(T),
}

impl<T> Receive<T> {
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Error channel shared by every receiver level.
pub trait ErrorEvents {
    /// A condition that prevents some or all of the stream from being delivered.
    fn on_error(&mut self, error: ParseError);

    /// A condition the parser recovered from.
    fn on_warning(&mut self, warning: ParseWarning) {
        let _ = warning;
    }
}

/// Top-level receiver for one stream.
pub trait ParserEvents: ErrorEvents {
    /// Parsing is about to begin.
    fn on_start(&mut self) {}

    /// The stream declared `version`. Declining stops the parse cleanly.
    fn on_version_received(&mut self, version: FormatVersion) -> Receive<&mut dyn HeaderEvents>;

    /// Parsing has ended, successfully or not.
    fn on_finish(&mut self) {}
}

/// Receives the parsed header.
pub trait HeaderEvents: ErrorEvents {
    /// Declining stops the parse before any body section is read.
    fn on_header_parsed(&mut self, header: &Header) -> Receive<&mut dyn BodyEvents>;
}

/// Receives body sections.
pub trait BodyEvents: ErrorEvents {
    fn on_vertices_non_interleaved(&mut self) -> Receive<&mut dyn NonInterleavedEvents>;

    fn on_triangles(&mut self) -> Receive<&mut dyn TriangleEvents>;

    /// A metadata section tagged with `schema` holding `size` octets.
    fn on_metadata(
        &mut self,
        schema: &SchemaIdentifier,
        size: u64,
    ) -> Receive<&mut dyn MetadataEvents>;
}

/// Receives the attributes of a non-interleaved vertex section.
pub trait NonInterleavedEvents: ErrorEvents {
    /// Values of `attribute` follow. Declined attributes are skipped.
    fn on_attribute_start(&mut self, attribute: &Attribute)
    -> Receive<&mut dyn AttributeValueEvents>;

    /// Every attribute has been offered.
    fn on_vertices_finish(&mut self) {}
}

/// Receives the values of one attribute, one vertex per call.
///
/// Only the method matching the attribute's component type is called, with
/// a slice of exactly `component_count` components.
pub trait AttributeValueEvents: ErrorEvents {
    fn on_float(&mut self, values: &[f64]);

    fn on_signed(&mut self, values: &[i64]);

    fn on_unsigned(&mut self, values: &[u64]);

    /// Called once after the last value, even if decoding failed part way.
    fn on_attribute_finish(&mut self) {}
}

/// Receives triangles.
pub trait TriangleEvents: ErrorEvents {
    fn on_triangle(&mut self, v0: u64, v1: u64, v2: u64);

    /// Called once after the last triangle, even if decoding failed part way.
    fn on_triangles_finish(&mut self) {}
}

/// Receives the payload of one metadata section.
pub trait MetadataEvents: ErrorEvents {
    fn on_metadata_data(&mut self, schema: &SchemaIdentifier, data: Vec<u8>);
}
