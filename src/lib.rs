//! Inspects the header segments of a JPEG stream.
//!
//! Decodes frame headers (baseline SOF0 and lossless SOF3), Huffman table
//! definitions, and scan headers, reconstructing the canonical Huffman code
//! assigned to every symbol per Annex C of ITU-T T.81. Entropy-coded scan
//! data is skipped, not decoded.

mod cursor;
mod error;
mod file;
mod huffman;

pub use cursor::ByteCursor;
pub use error::Error;
pub use file::{
    markers, Dht, FrameComponent, FrameHeader, HuffmanTable, JpegInspector, ScanComponent,
    ScanHeader, Segment, SegmentKind, SofMarker,
};
pub use huffman::{CodeEntry, CodeTable};
