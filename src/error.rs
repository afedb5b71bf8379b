use core::fmt;

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;

pub struct Error {
    repr: Repr,
}

pub(crate) enum Repr {
    /// Stream does not begin with the SOI marker.
    InvalidSoi { found: u16 },
    /// DHT contents inconsistent with the remaining stream.
    MalformedHuffmanTable(String),
}

impl Error {
    pub(crate) fn invalid_soi(found: u16) -> Self {
        Self {
            repr: Repr::InvalidSoi { found },
        }
    }

    pub(crate) fn malformed_huffman_table(msg: impl Into<String>) -> Self {
        Self {
            repr: Repr::MalformedHuffmanTable(msg.into()),
        }
    }

    /// True if the stream was rejected for not starting with SOI.
    pub fn is_invalid_soi(&self) -> bool {
        matches!(self.repr, Repr::InvalidSoi { .. })
    }

    /// True if a Huffman table definition was inconsistent with the stream.
    pub fn is_malformed_huffman_table(&self) -> bool {
        matches!(self.repr, Repr::MalformedHuffmanTable(_))
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::InvalidSoi { found } => write!(
                f,
                "stream does not begin with SOI marker (found {found:#06x})"
            ),
            Repr::MalformedHuffmanTable(msg) => write!(f, "malformed Huffman table: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
