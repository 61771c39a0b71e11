//! Cursors and component codecs.
//!
//! [`Cursor`] tracks which element of a fixed-stride buffer is next;
//! [`CursorCodec`] turns logical values into stored components at that
//! position and back.

pub mod codec;
pub mod index;

pub use codec::{ComponentCodec, ComponentValue, CursorCodec, FloatWidth, IntegerWidth};
pub use index::{Cursor, ElementIndex};
