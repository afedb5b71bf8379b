//! JPEG marker segment parser and report model.

#![allow(non_snake_case)]


use std::fmt;

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::huffman::CodeTable;

/// JPEG marker codes (2-byte big-endian wire values).
pub mod markers {
    /// Start Of Image.
    pub const SOI: u16 = 0xFFD8;
    /// Baseline DCT frame header.
    pub const SOF0: u16 = 0xFFC0;
    /// Lossless (sequential) frame header.
    pub const SOF3: u16 = 0xFFC3;
    /// Define Huffman Tables.
    pub const DHT: u16 = 0xFFC4;
    /// Start Of Scan.
    pub const SOS: u16 = 0xFFDA;
}

/// Classification of a peeked 16-bit value from the stream.
#[derive(Clone, Copy, PartialEq, Eq)]
enum MarkerKind {
    /// Byte stuffing or entropy-coded data; not a marker.
    Filler,
    Sof0,
    Sof3,
    Dht,
    Sos,
    /// A marker this tool does not decode.
    Unknown,
}

impl MarkerKind {
    fn classify(value: u16) -> Self {
        match value {
            0x0000..=0xFF01 | 0xFFFF => Self::Filler,
            markers::SOF0 => Self::Sof0,
            markers::SOF3 => Self::Sof3,
            markers::DHT => Self::Dht,
            markers::SOS => Self::Sos,
            _ => Self::Unknown,
        }
    }
}

/// Streaming parser over the marker segments of a JPEG byte buffer.
#[derive(Debug)]
pub struct JpegInspector<'a> {
    cursor: ByteCursor<'a>,
}

impl<'a> JpegInspector<'a> {
    /// Checks the leading SOI marker and positions the parser on the first
    /// segment.
    pub fn new(buf: &'a [u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(buf);
        let leading = cursor.read_int(2) as u16;
        if leading != markers::SOI {
            return Err(Error::invalid_soi(leading));
        }
        Ok(Self { cursor })
    }

    /// Scans forward to the next recognized segment and parses it.
    ///
    /// Filler bytes and markers this tool does not decode are skipped one
    /// byte at a time. Returns `Ok(None)` once the buffer is exhausted.
    pub fn next_segment(&mut self) -> Result<Option<Segment>> {
        while self.cursor.has_next() {
            if !self.cursor.has_2_next() {
                // Lone trailing byte.
                self.cursor.skip();
                continue;
            }

            let offset = self.cursor.position();
            let value = self.cursor.peek_int(2) as u16;
            let kind = match MarkerKind::classify(value) {
                MarkerKind::Filler => {
                    self.cursor.skip();
                    continue;
                }
                MarkerKind::Unknown => {
                    log::trace!("skipping unhandled marker {value:#06x} at offset {offset}");
                    self.cursor.skip();
                    continue;
                }
                MarkerKind::Sof0 | MarkerKind::Sof3 => {
                    SegmentKind::Sof(self.read_frame_header())
                }
                MarkerKind::Dht => SegmentKind::Dht(self.read_dht()?),
                MarkerKind::Sos => SegmentKind::Sos(self.read_scan_header()),
            };
            return Ok(Some(Segment { offset, kind }));
        }
        Ok(None)
    }

    fn read_frame_header(&mut self) -> FrameHeader {
        let sof = SofMarker(self.cursor.read_int(2) as u16);
        let Lf = self.cursor.read_int(2) as u16;
        let P = self.cursor.read_int(1) as u8;
        let Y = self.cursor.read_int(2) as u16;
        let X = self.cursor.read_int(2) as u16;
        let Nf = self.cursor.read_int(1) as u8;
        let mut components = Vec::with_capacity(usize::from(Nf));
        for _ in 0..Nf {
            components.push(FrameComponent {
                Ci: self.cursor.read_int(1) as u8,
                HiVi: self.cursor.read_int(1) as u8,
                Tqi: self.cursor.read_int(1) as u8,
            });
        }
        FrameHeader {
            sof,
            Lf,
            P,
            Y,
            X,
            components,
        }
    }

    fn read_dht(&mut self) -> Result<Dht> {
        // Tc/Th byte plus the 16 length counts.
        const TABLE_HEADER_LEN: usize = 17;

        self.cursor.read_int(2); // marker
        let Lh = self.cursor.read_int(2) as u16;

        // `Lh` counts its own two bytes. The first table is parsed
        // unconditionally; a segment may define several tables back to back.
        let mut left = usize::from(Lh).saturating_sub(2);
        let mut tables = Vec::new();
        loop {
            let (consumed, table) = self.read_huffman_table()?;
            tables.push(table);
            left = left.saturating_sub(consumed);
            if left < TABLE_HEADER_LEN || self.cursor.remaining() < TABLE_HEADER_LEN {
                break;
            }
        }

        Ok(Dht { Lh, tables })
    }

    fn read_huffman_table(&mut self) -> Result<(usize, HuffmanTable)> {
        let TcTh = self.cursor.read_int(1) as u8;
        let mut Li = [0u8; 16];
        for li in &mut Li {
            *li = self.cursor.read_int(1) as u8;
        }

        let num_values: usize = Li.iter().map(|&l| usize::from(l)).sum();
        if num_values > self.cursor.remaining() {
            return Err(Error::malformed_huffman_table(format!(
                "table declares {num_values} symbols but only {} bytes remain",
                self.cursor.remaining()
            )));
        }
        let mut Vij = Vec::with_capacity(num_values);
        for _ in 0..num_values {
            Vij.push(self.cursor.read_int(1) as u8);
        }

        let codes = CodeTable::build(&Li, &Vij)?;
        Ok((1 + Li.len() + num_values, HuffmanTable { TcTh, Li, codes }))
    }

    fn read_scan_header(&mut self) -> ScanHeader {
        self.cursor.read_int(2); // marker
        let Ls = self.cursor.read_int(2) as u16;
        let Ns = self.cursor.read_int(1) as u8;
        let mut components = Vec::with_capacity(usize::from(Ns));
        for _ in 0..Ns {
            components.push(ScanComponent {
                Csj: self.cursor.read_int(1) as u8,
                TdjTaj: self.cursor.read_int(1) as u8,
            });
        }
        let Ss = self.cursor.read_int(1) as u8;
        let Se = self.cursor.read_int(1) as u8;
        let AhAl = self.cursor.read_int(1) as u8;
        ScanHeader {
            Ls,
            components,
            Ss,
            Se,
            AhAl,
        }
    }
}

/// A parsed segment together with the offset of its marker in the stream.
#[derive(Debug)]
pub struct Segment {
    offset: usize,
    kind: SegmentKind,
}

impl Segment {
    /// Offset of the segment's marker in the input buffer.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn kind(&self) -> &SegmentKind {
        &self.kind
    }
}

/// Enumeration of segment kinds decoded by this parser.
#[derive(Debug)]
pub enum SegmentKind {
    Sof(FrameHeader),
    Dht(Dht),
    Sos(ScanHeader),
}

/// The specific SOF marker that introduced a frame header.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SofMarker(u16);

impl SofMarker {
    /// Baseline DCT.
    pub const SOF0: Self = Self(markers::SOF0);
    /// Lossless (sequential).
    pub const SOF3: Self = Self(markers::SOF3);

    /// The 2-byte wire value of the marker.
    #[inline]
    pub fn value(&self) -> u16 {
        self.0
    }

    fn describe(&self) -> &'static str {
        match *self {
            Self::SOF0 => "baseline",
            Self::SOF3 => "lossless",
            _ => "unrecognized",
        }
    }
}

impl fmt::Debug for SofMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::SOF0 => f.write_str("SOF0"),
            Self::SOF3 => f.write_str("SOF3"),
            _ => f
                .debug_tuple("SofMarker")
                .field(&format_args!("{:04x}", self.0))
                .finish(),
        }
    }
}

/// **SOF** frame header (B.2.2).
#[derive(Debug)]
pub struct FrameHeader {
    sof: SofMarker,
    Lf: u16,
    P: u8,
    Y: u16,
    X: u16,
    components: Vec<FrameComponent>,
}

impl FrameHeader {
    /// The SOF marker that introduced this frame.
    #[inline]
    pub fn sof(&self) -> SofMarker {
        self.sof
    }

    /// Frame header length in bytes, including the length field itself.
    #[inline]
    pub fn Lf(&self) -> u16 {
        self.Lf
    }

    /// Sample precision in bits.
    #[inline]
    pub fn P(&self) -> u8 {
        self.P
    }

    /// Number of lines in the frame (the height).
    #[inline]
    pub fn Y(&self) -> u16 {
        self.Y
    }

    /// Number of samples per line (the width).
    #[inline]
    pub fn X(&self) -> u16 {
        self.X
    }

    #[inline]
    pub fn components(&self) -> &[FrameComponent] {
        &self.components
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FrameComponent {
    Ci: u8,
    HiVi: u8,
    Tqi: u8,
}

impl FrameComponent {
    /// Component identifier; scan headers refer to components by it.
    #[inline]
    pub fn Ci(&self) -> u8 {
        self.Ci
    }

    /// Horizontal sampling factor.
    #[inline]
    pub fn Hi(&self) -> u8 {
        self.HiVi >> 4
    }

    /// Vertical sampling factor.
    #[inline]
    pub fn Vi(&self) -> u8 {
        self.HiVi & 0xf
    }

    /// Quantization table destination selector.
    #[inline]
    pub fn Tqi(&self) -> u8 {
        self.Tqi
    }
}

/// **DHT** Define Huffman Tables segment (B.2.4.2).
#[derive(Debug)]
pub struct Dht {
    Lh: u16,
    tables: Vec<HuffmanTable>,
}

impl Dht {
    /// Segment length in bytes, including the length field itself.
    #[inline]
    pub fn Lh(&self) -> u16 {
        self.Lh
    }

    pub fn tables(&self) -> impl Iterator<Item = &HuffmanTable> {
        self.tables.iter()
    }
}

/// One table definition inside a DHT segment, with its reconstructed codes.
#[derive(Debug)]
pub struct HuffmanTable {
    TcTh: u8,
    Li: [u8; 16],
    codes: CodeTable,
}

impl HuffmanTable {
    /// Table class (0 = DC, 1 = AC).
    #[inline]
    pub fn Tc(&self) -> u8 {
        self.TcTh >> 4
    }

    /// Table destination identifier (0-3).
    #[inline]
    pub fn Th(&self) -> u8 {
        self.TcTh & 0xf
    }

    /// Number of codes of each bit length, 1 to 16.
    #[inline]
    pub fn Li(&self) -> &[u8; 16] {
        &self.Li
    }

    /// The canonical code assigned to every symbol.
    #[inline]
    pub fn codes(&self) -> &CodeTable {
        &self.codes
    }
}

/// **SOS** scan header (B.2.3). The entropy-coded data that follows it is
/// not decoded.
#[derive(Debug)]
pub struct ScanHeader {
    Ls: u16,
    components: Vec<ScanComponent>,
    Ss: u8,
    Se: u8,
    AhAl: u8,
}

impl ScanHeader {
    /// Scan header length in bytes, including the length field itself.
    #[inline]
    pub fn Ls(&self) -> u16 {
        self.Ls
    }

    #[inline]
    pub fn components(&self) -> &[ScanComponent] {
        &self.components
    }

    /// Start of spectral selection (the predictor selector for lossless
    /// frames).
    #[inline]
    pub fn Ss(&self) -> u8 {
        self.Ss
    }

    /// End of spectral selection.
    #[inline]
    pub fn Se(&self) -> u8 {
        self.Se
    }

    /// Successive approximation bit position, high.
    #[inline]
    pub fn Ah(&self) -> u8 {
        self.AhAl >> 4
    }

    /// Successive approximation bit position, low (the point transform for
    /// lossless frames).
    #[inline]
    pub fn Al(&self) -> u8 {
        self.AhAl & 0xf
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScanComponent {
    Csj: u8,
    TdjTaj: u8,
}

impl ScanComponent {
    /// Scan component selector.
    #[inline]
    pub fn Csj(&self) -> u8 {
        self.Csj
    }

    /// DC entropy coding table destination selector.
    #[inline]
    pub fn Tdj(&self) -> u8 {
        self.TdjTaj >> 4
    }

    /// AC entropy coding table destination selector (0 for lossless scans).
    #[inline]
    pub fn Taj(&self) -> u8 {
        self.TdjTaj & 0xf
    }
}

/// Writes one report line: field name, declared bit width, hex and decimal
/// value.
fn field(
    f: &mut fmt::Formatter<'_>,
    indent: usize,
    name: &str,
    bits: u8,
    value: u32,
) -> fmt::Result {
    let w = usize::from(bits / 4) + 2;
    writeln!(
        f,
        "{:indent$}{name:<4} ({bits:2} bits) {value:#0w$x} = {value}",
        ""
    )
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x} ", self.offset)?;
        match &self.kind {
            SegmentKind::Sof(frame) => fmt::Display::fmt(frame, f),
            SegmentKind::Dht(dht) => fmt::Display::fmt(dht, f),
            SegmentKind::Sos(scan) => fmt::Display::fmt(scan, f),
        }
    }
}

impl fmt::Display for FrameHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:?} {} frame header (B.2.2) marker {:#06x} = {}",
            self.sof,
            self.sof.describe(),
            self.sof.value(),
            self.sof.value(),
        )?;
        field(f, 2, "Lf", 16, self.Lf.into())?;
        field(f, 2, "P", 8, self.P.into())?;
        field(f, 2, "Y", 16, self.Y.into())?;
        field(f, 2, "X", 16, self.X.into())?;
        field(f, 2, "Nf", 8, self.components.len() as u32)?;
        for (i, component) in self.components.iter().enumerate() {
            writeln!(f, "  component {}", i + 1)?;
            field(f, 4, "C", 8, component.Ci().into())?;
            field(f, 4, "H", 4, component.Hi().into())?;
            field(f, 4, "V", 4, component.Vi().into())?;
            field(f, 4, "Tq", 8, component.Tqi().into())?;
        }
        Ok(())
    }
}

impl fmt::Display for Dht {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "DHT Huffman table definition (B.2.4.2) marker {:#06x} = {}",
            markers::DHT,
            markers::DHT,
        )?;
        field(f, 2, "Lh", 16, self.Lh.into())?;
        for (i, table) in self.tables.iter().enumerate() {
            writeln!(f, "  table {}", i + 1)?;
            field(f, 4, "Tc", 4, table.Tc().into())?;
            field(f, 4, "Th", 4, table.Th().into())?;
            for (length, &count) in table.Li().iter().enumerate() {
                if count != 0 {
                    field(f, 4, &format!("L{}", length + 1), 8, count.into())?;
                }
            }
            for entry in table.codes().entries() {
                writeln!(
                    f,
                    "    SSSS {:#04x}: code {} -> {:03$b}",
                    entry.value(),
                    entry.code(),
                    entry.code(),
                    usize::from(entry.bits()),
                )?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for ScanHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "SOS scan header (B.2.3) marker {:#06x} = {}",
            markers::SOS,
            markers::SOS,
        )?;
        field(f, 2, "Ls", 16, self.Ls.into())?;
        field(f, 2, "Ns", 8, self.components.len() as u32)?;
        for (j, component) in self.components.iter().enumerate() {
            writeln!(f, "  component {}", j + 1)?;
            field(f, 4, "Cs", 8, component.Csj().into())?;
            field(f, 4, "Td", 4, component.Tdj().into())?;
            field(f, 4, "Ta", 4, component.Taj().into())?;
        }
        field(f, 2, "Ss", 8, self.Ss.into())?;
        field(f, 2, "Se", 8, self.Se.into())?;
        field(f, 2, "Ah", 4, self.Ah().into())?;
        field(f, 2, "Al", 4, self.Al().into())?;
        Ok(())
    }
}
