//! Sequential binary stream parser.

use std::io::Read;

use tracing::{debug, warn};

use super::body::{parse_metadata, parse_triangles, parse_vertices_non_interleaved};
use super::header_codec::HeaderCodec;
use super::read_preamble;
use super::section::{SectionHeader, SectionKind};
use super::stream::StreamReader;
use crate::error::{Error, ParseError, ParseWarning, Result};
use crate::events::{BodyEvents, ErrorEvents, HeaderEvents, ParserEvents, Receive};
use crate::model::{FormatVersion, Header};

/// Where the parser is in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    AwaitingVersion,
    AwaitingHeaderSection,
    ParsingHeader,
    AwaitingBodySection,
    Dispatching,
    /// Parsing stopped cleanly: end of stream reached or a receiver declined.
    Done,
    /// At least one error was reported.
    Failed,
}

/// Which required body sections have been seen.
#[derive(Debug, Default, Clone, Copy)]
struct Received {
    vertices: bool,
    triangles: bool,
}

/// Parses one SMF binary stream, pushing its contents into [`ParserEvents`].
///
/// ```no_run
/// # use smfkit::binary::BinaryParser;
/// # fn run(file: std::fs::File, events: &mut dyn smfkit::events::ParserEvents) {
/// let mut parser = BinaryParser::new(std::io::BufReader::new(file));
/// parser.parse(events);
/// # }
/// ```
#[derive(Debug)]
pub struct BinaryParser<R> {
    reader: StreamReader<R>,
    state: ParserState,
    errors: usize,
}

impl<R: Read> BinaryParser<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: StreamReader::new(reader),
            state: ParserState::AwaitingVersion,
            errors: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Octets consumed so far.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.reader.position()
    }

    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    /// Parse the whole stream. Returns the final state, `Done` or `Failed`.
    pub fn parse(&mut self, events: &mut dyn ParserEvents) -> ParserState {
        events.on_start();
        self.run(events);
        if self.errors > 0 {
            self.state = ParserState::Failed;
        } else if self.state != ParserState::Failed {
            self.state = ParserState::Done;
        }
        events.on_finish();
        self.state
    }

    fn run(&mut self, events: &mut dyn ParserEvents) {
        self.state = ParserState::AwaitingVersion;
        let version = match read_preamble(&mut self.reader) {
            Ok(version) => version,
            Err(e) => {
                let e = self.eof_as_structural(e);
                self.fail(events, ParseError::at(0, e));
                return;
            }
        };
        debug!("SMF binary version {}", version);

        let Receive::Accepted(header_events) = events.on_version_received(version) else {
            debug!("Receiver declined version {}", version);
            self.state = ParserState::Done;
            return;
        };

        let Some(codec) = HeaderCodec::for_reading(version) else {
            self.fail(
                header_events,
                ParseError::at(
                    8,
                    Error::UnsupportedVersion {
                        major: version.major,
                        minor: version.minor,
                    },
                ),
            );
            return;
        };

        self.run_header(version, codec, header_events);
    }

    fn run_header(
        &mut self,
        version: FormatVersion,
        codec: HeaderCodec,
        events: &mut dyn HeaderEvents,
    ) {
        self.state = ParserState::AwaitingHeaderSection;
        let section = match SectionHeader::read(&mut self.reader) {
            Ok(section) => section,
            Err(e) => {
                let position = self.reader.position();
                self.fail(events, ParseError::at(position, e));
                return;
            }
        };
        if section.kind() != SectionKind::Header {
            self.fail(
                events,
                ParseError::at(
                    section.offset,
                    Error::UnexpectedFirstSection {
                        expected: SectionKind::Header.magic(),
                        received: section.magic,
                    },
                ),
            );
            return;
        }

        self.state = ParserState::ParsingHeader;
        let header = match self.read_header(version, codec, &section) {
            Ok(header) => header,
            Err(e) => {
                self.fail(events, ParseError::at(section.payload_offset(), e));
                return;
            }
        };
        debug!(
            "Parsed header: {} attributes, {} vertices, {} triangles",
            header.attribute_count(),
            header.vertex_count(),
            header.triangles().count()
        );

        let Receive::Accepted(body) = events.on_header_parsed(&header) else {
            debug!("Receiver declined body");
            self.state = ParserState::Done;
            return;
        };

        self.run_body(&header, body);
    }

    fn read_header(
        &mut self,
        version: FormatVersion,
        codec: HeaderCodec,
        section: &SectionHeader,
    ) -> Result<Header> {
        let header = {
            let mut bounded = self.reader.bounded(section.size_of_data)?;
            codec.decode(version, &mut bounded, section.size_of_data)?
        };
        self.skip_to(section.next_section_offset()?)?;
        Ok(header)
    }

    fn run_body(&mut self, header: &Header, body: &mut dyn BodyEvents) {
        let mut received = Received::default();

        loop {
            self.state = ParserState::AwaitingBodySection;
            let section = match SectionHeader::read(&mut self.reader) {
                Ok(section) => section,
                Err(e) => {
                    let position = self.reader.position();
                    self.fail(body, ParseError::at(position, e));
                    return;
                }
            };

            self.state = ParserState::Dispatching;
            let kind = section.kind();
            debug!(
                "Section {} at {} ({} octets)",
                kind, section.offset, section.size_of_data
            );

            if kind == SectionKind::End {
                if section.size_of_data != 0 {
                    self.warn(
                        body,
                        section.offset,
                        format!("end section declares {} octets", section.size_of_data),
                    );
                }
                break;
            }

            let ok = match self.reader.bounded(section.size_of_data) {
                Ok(mut bounded) => match kind {
                    SectionKind::VerticesNonInterleaved => {
                        received.vertices = true;
                        parse_vertices_non_interleaved(header, &mut bounded, body)
                    }
                    SectionKind::Triangles => {
                        received.triangles = true;
                        parse_triangles(header, &mut bounded, body)
                    }
                    SectionKind::Metadata => parse_metadata(&mut bounded, body),
                    SectionKind::Header | SectionKind::End | SectionKind::Unknown(_) => true,
                },
                Err(e) => {
                    body.on_error(ParseError::at(section.offset, e));
                    false
                }
            };
            if !ok {
                self.errors += 1;
            }

            match kind {
                SectionKind::Header => {
                    self.warn(body, section.offset, "Duplicate header section ignored.".into());
                }
                SectionKind::Unknown(magic) => {
                    self.warn(
                        body,
                        section.offset,
                        format!("Unrecognized section type {magic:#018x}, skipping."),
                    );
                }
                _ => {}
            }

            let resync = section
                .next_section_offset()
                .and_then(|next| self.skip_to(next));
            if let Err(e) = resync {
                let position = self.reader.position();
                self.fail(body, ParseError::at(position, e));
                return;
            }
        }

        if header.vertex_count() != 0 && header.attribute_count() != 0 && !received.vertices {
            self.fail(
                body,
                ParseError::unpositioned(Error::MissingVertices(header.vertex_count())),
            );
        }
        if header.triangles().count() != 0 && !received.triangles {
            self.fail(
                body,
                ParseError::unpositioned(Error::MissingTriangles(header.triangles().count())),
            );
        }
    }

    fn skip_to(&mut self, target: u64) -> Result<()> {
        let position = self.reader.position();
        if target > position {
            self.reader.skip(target - position)?;
        }
        Ok(())
    }

    fn eof_as_structural(&self, error: Error) -> Error {
        match error {
            Error::Io(ref io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
                Error::UnexpectedEndOfStream {
                    position: self.reader.position(),
                }
            }
            other => other,
        }
    }

    fn fail<E: ErrorEvents + ?Sized>(&mut self, events: &mut E, error: ParseError) {
        warn!("SMF parse error: {}", error);
        self.errors += 1;
        self.state = ParserState::Failed;
        events.on_error(error);
    }

    fn warn<E: ErrorEvents + ?Sized>(&self, events: &mut E, position: u64, message: String) {
        warn!("SMF parse warning at {}: {}", position, message);
        events.on_warning(ParseWarning {
            position: Some(position),
            message,
        });
    }
}
