//! Fortran-style record writer with a mirrored text trace.
//!
//! Every OP2 record is a run of 4-byte words.  Framing words (the `4`s in
//! `[4, 3, 4]`, the `28`s around the tape code) are *literal values chosen by
//! the caller*; [`FrameWriter`] never computes them.  It only transcribes.
//!
//! # Channels
//! A [`FrameWriter`] owns two sinks that always advance together:
//! - the binary channel receives the packed words in the selected [`Endian`];
//! - the trace channel receives exactly one line per binary write, e.g.
//!   `markers = [2, 4]` or `footer2 = [4, -1, 4, 4, 1, 4, 4, 0, 4]`.
//!
//! The trace is meant for diffing two runs by eye, so byte strings are
//! rendered as quoted text when they are valid UTF-8 and as hex otherwise.

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};
use std::io::{self, Write};

// ── Endian ───────────────────────────────────────────────────────────────────

/// Byte order of every word written to the binary channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

impl Endian {
    /// Human-readable name (for diagnostics and the CLI).
    pub fn name(self) -> &'static str {
        match self {
            Endian::Little => "little",
            Endian::Big    => "big",
        }
    }

    /// Parse from a CLI string.  Accepts the struct-module spellings `<`/`>`.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "little" | "le" | "<" => Some(Endian::Little),
            "big"    | "be" | ">" => Some(Endian::Big),
            _                     => None,
        }
    }
}

// ── Field ────────────────────────────────────────────────────────────────────

/// One value inside a block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<'a> {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    /// Fixed-width byte string, written verbatim with no padding.
    Bytes(&'a [u8]),
}

impl Field<'_> {
    fn encode<B: ByteOrder>(&self, buf: &mut Vec<u8>) -> io::Result<()> {
        match *self {
            Field::Int(v)    => buf.write_i32::<B>(v),
            Field::Long(v)   => buf.write_i64::<B>(v),
            Field::Float(v)  => buf.write_f32::<B>(v),
            Field::Double(v) => buf.write_f64::<B>(v),
            Field::Bytes(b)  => buf.write_all(b),
        }
    }

    fn render(&self) -> String {
        match *self {
            Field::Int(v)    => v.to_string(),
            Field::Long(v)   => v.to_string(),
            Field::Float(v)  => v.to_string(),
            Field::Double(v) => v.to_string(),
            Field::Bytes(b)  => match std::str::from_utf8(b) {
                Ok(s)  => format!("{s:?}"),
                Err(_) => format!("0x{}", hex::encode(b)),
            },
        }
    }
}

fn render_list<T, F: Fn(&T) -> String>(items: &[T], f: F) -> String {
    let parts: Vec<String> = items.iter().map(f).collect();
    format!("[{}]", parts.join(", "))
}

// ── FrameWriter ──────────────────────────────────────────────────────────────

/// Binary + trace sink shared by the header writer, the table sequencer and
/// every result encoder.
pub struct FrameWriter<'a> {
    binary:        &'a mut dyn Write,
    trace:         &'a mut dyn Write,
    endian:        Endian,
    bytes_written: u64,
}

impl<'a> FrameWriter<'a> {
    pub fn new(binary: &'a mut dyn Write, trace: &'a mut dyn Write, endian: Endian) -> Self {
        Self { binary, trace, endian, bytes_written: 0 }
    }

    pub fn endian(&self) -> Endian { self.endian }

    /// Total bytes sent to the binary channel so far.
    pub fn bytes_written(&self) -> u64 { self.bytes_written }

    /// Write each marker `m` as the three-word record `[4, m, 4]`.
    ///
    /// All markers go out in a single binary write with a single trace line
    /// listing the bare marker values.
    pub fn write_markers(&mut self, markers: &[i32]) -> io::Result<()> {
        let words: Vec<i32> = markers.iter().flat_map(|&m| [4, m, 4]).collect();
        let bytes = self.pack_ints(&words)?;
        self.emit(&bytes, &format!("markers = {}", render_list(markers, i32::to_string)))
    }

    /// Write `fields` verbatim.  The caller supplies any length words.
    pub fn write_block(&mut self, fields: &[Field<'_>]) -> io::Result<()> {
        let mut buf = Vec::new();
        for field in fields {
            match self.endian {
                Endian::Little => field.encode::<LittleEndian>(&mut buf)?,
                Endian::Big    => field.encode::<BigEndian>(&mut buf)?,
            }
        }
        self.emit(&buf, &format!("block = {}", render_list(fields, Field::render)))
    }

    /// Write a literal integer sequence under a caller-chosen trace label.
    pub fn write_ints(&mut self, label: &str, values: &[i32]) -> io::Result<()> {
        let bytes = self.pack_ints(values)?;
        self.emit(&bytes, &format!("{label} = {}", render_list(values, i32::to_string)))
    }

    /// Flush both channels.
    pub fn flush(&mut self) -> io::Result<()> {
        self.binary.flush()?;
        self.trace.flush()
    }

    fn pack_ints(&self, values: &[i32]) -> io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(values.len() * 4);
        for &v in values {
            match self.endian {
                Endian::Little => buf.write_i32::<LittleEndian>(v)?,
                Endian::Big    => buf.write_i32::<BigEndian>(v)?,
            }
        }
        Ok(buf)
    }

    fn emit(&mut self, bytes: &[u8], line: &str) -> io::Result<()> {
        self.binary.write_all(bytes)?;
        writeln!(self.trace, "{line}")?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run<F>(endian: Endian, f: F) -> (Vec<u8>, String)
    where
        F: FnOnce(&mut FrameWriter<'_>) -> io::Result<()>,
    {
        let mut bin = Vec::new();
        let mut txt = Vec::new();
        {
            let mut fw = FrameWriter::new(&mut bin, &mut txt, endian);
            f(&mut fw).unwrap();
        }
        (bin, String::from_utf8(txt).unwrap())
    }

    #[test]
    fn markers_are_framed_by_four() {
        let (bin, txt) = run(Endian::Little, |fw| fw.write_markers(&[2, 4]));
        let words: Vec<i32> = bin.chunks(4).map(LittleEndian::read_i32).collect();
        assert_eq!(words, vec![4, 2, 4, 4, 4, 4]);
        assert_eq!(txt, "markers = [2, 4]\n");
    }

    #[test]
    fn big_endian_words() {
        let (bin, _) = run(Endian::Big, |fw| fw.write_ints("close_b", &[4, 0, 4]));
        assert_eq!(bin, vec![0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0, 4]);
    }

    #[test]
    fn block_trace_decodes_strings() {
        let (bin, txt) = run(Endian::Little, |fw| {
            fw.write_block(&[Field::Int(8), Field::Bytes(b"NX8.5   "), Field::Int(8)])
        });
        assert_eq!(bin.len(), 16);
        assert_eq!(&bin[4..12], b"NX8.5   ");
        assert_eq!(txt, "block = [8, \"NX8.5   \", 8]\n");
    }

    #[test]
    fn non_utf8_bytes_render_as_hex() {
        let (_, txt) = run(Endian::Little, |fw| fw.write_block(&[Field::Bytes(&[0xff, 0x00])]));
        assert_eq!(txt, "block = [0xff00]\n");
    }

    #[test]
    fn one_trace_line_per_write() {
        let mut bin = Vec::new();
        let mut txt = Vec::new();
        let written = {
            let mut fw = FrameWriter::new(&mut bin, &mut txt, Endian::Little);
            fw.write_markers(&[3]).unwrap();
            fw.write_block(&[Field::Double(1.5), Field::Float(0.25)]).unwrap();
            fw.write_ints("footer2", &[4, -1, 4]).unwrap();
            fw.bytes_written()
        };
        assert_eq!(written, 12 + 12 + 12);
        assert_eq!(written, bin.len() as u64);
        assert_eq!(String::from_utf8(txt).unwrap().lines().count(), 3);
    }

    #[test]
    fn endian_names() {
        assert_eq!(Endian::from_name("BIG"), Some(Endian::Big));
        assert_eq!(Endian::from_name("<"), Some(Endian::Little));
        assert_eq!(Endian::from_name("middle"), None);
    }
}
