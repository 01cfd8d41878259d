//! The byte cursor: the single point through which every production in
//! [`crate::reader`] and [`crate::doctype`] reads input.
//!
//! A cursor exposes one byte, `current()`, and one operation, `advance()`.
//! Besides the real source (an in-memory buffer or a file), a cursor can
//! have any number of *virtual streams* pushed onto it — buffers of entity
//! replacement text that are read in place of the source until exhausted,
//! then transparently popped so reading resumes where it left off. This is
//! what lets `&amp;` expansion, and the whole of parameter-entity expansion
//! inside a DTD, be implemented without the productions that call
//! `advance()` ever needing to know where the bytes are actually coming
//! from.

use std::fs::File;
use std::io::{self, BufReader, Read};

use crate::error::{Error, Position, Result};

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Where a cursor reads its real (non-virtual) bytes from.
enum RealSource {
    Memory { data: Vec<u8>, pos: usize },
    File { reader: BufReader<File> },
}

impl RealSource {
    /// Reads the next raw byte, with no BOM handling. Returns `\0` at EOF
    /// *and* on I/O failure — callers distinguish the two with
    /// [`Cursor::take_error`], matching the convention used throughout this
    /// crate (a NUL byte in real input never occurs in well-formed XML, so
    /// it is safe to overload as the end-of-source sentinel).
    fn read_byte(&mut self) -> io::Result<u8> {
        match self {
            RealSource::Memory { data, pos } => {
                if *pos < data.len() {
                    let b = data[*pos];
                    *pos += 1;
                    Ok(b)
                } else {
                    Ok(0)
                }
            }
            RealSource::File { reader } => {
                let mut buf = [0u8; 1];
                match reader.read(&mut buf)? {
                    0 => Ok(0),
                    _ => Ok(buf[0]),
                }
            }
        }
    }
}

/// Either a fully-buffered in-memory document or a read-only file handle.
///
/// A parser owns exactly one `Source`, never both — this mirrors
/// `parser_new`'s "`source` is either ... (not both)" contract.
pub enum Source {
    /// A document already fully read into memory.
    Memory(Vec<u8>),
    /// A document read lazily, one byte at a time, from a file.
    File(File),
}

impl Source {
    fn into_real_source(self) -> io::Result<RealSource> {
        match self {
            Source::Memory(data) => Ok(RealSource::Memory { data, pos: 0 }),
            Source::File(file) => Ok(RealSource::File {
                reader: BufReader::new(file),
            }),
        }
    }
}

/// A virtual stream frame: a pointer into replacement text substituted for
/// the real source until it runs dry.
struct StreamFrame {
    text: Vec<u8>,
    pos: usize,
}

impl StreamFrame {
    /// Pops the next byte, or `None` if this frame is exhausted. A `\0` byte
    /// embedded in replacement text is impossible here because replacement
    /// text always comes from well-formed entity values or DTD file
    /// contents, neither of which can validly contain one.
    fn next_byte(&mut self) -> Option<u8> {
        if self.pos < self.text.len() {
            let b = self.text[self.pos];
            self.pos += 1;
            Some(b)
        } else {
            None
        }
    }
}

/// The cursor: one current byte, advanced one step at a time, transparently
/// reading through any pushed virtual streams before falling back to the
/// real source.
pub struct Cursor {
    source: RealSource,
    streams: Vec<StreamFrame>,
    current: u8,
    row: u64,
    col: u64,
    pending_error: Option<io::Error>,
}

impl Cursor {
    /// Creates a cursor over `source`, consuming a leading UTF-8 BOM if
    /// present and priming `current()` with the first logical byte.
    pub fn new(source: Source) -> Result<Self> {
        let mut real = source.into_real_source()?;
        let mut cursor = Cursor {
            source: real_with_bom_stripped(&mut real)?,
            streams: Vec::new(),
            current: 0,
            row: 1,
            col: 1,
            pending_error: None,
        };
        cursor.advance();
        cursor.take_error()?;
        Ok(cursor)
    }

    /// The byte the cursor currently sits on. `\0` means end of document
    /// (when no virtual stream is active) *or* that the underlying source
    /// failed — call [`Cursor::take_error`] to tell the two apart.
    #[inline]
    pub fn current(&self) -> u8 {
        self.current
    }

    /// The 1-based row/column of `current()`'s first byte in the *real*
    /// source. Positions are frozen while a virtual stream is active, so
    /// entity expansion reports the position of the reference site rather
    /// than wandering into the replacement text.
    #[inline]
    pub fn position(&self) -> Position {
        Position {
            row: self.row,
            col: self.col,
        }
    }

    /// Takes any I/O error recorded since the last call, if one occurred.
    /// A `current()` of `\0` with no pending error means genuine end of
    /// document.
    pub fn take_error(&mut self) -> Result<()> {
        match self.pending_error.take() {
            Some(err) => Err(Error::Io(err)),
            None => Ok(()),
        }
    }

    /// Advances past `current()` and returns the new current byte. On I/O
    /// failure, `current()` becomes `\0` and the error is recorded for the
    /// next [`Cursor::take_error`] call.
    pub fn advance(&mut self) -> u8 {
        while let Some(frame) = self.streams.last_mut() {
            if let Some(b) = frame.next_byte() {
                self.current = b;
                return self.current;
            }
            self.streams.pop();
        }

        if self.current == b'\n' {
            self.row += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        self.current = match self.source.read_byte() {
            Ok(b) => b,
            Err(err) => {
                self.pending_error = Some(err);
                0
            }
        };
        self.current
    }

    /// Pushes `text` as a virtual stream and primes `current()` with its
    /// first byte (or, if `text` is empty, immediately resumes whatever was
    /// being read before).
    pub fn push_stream(&mut self, text: Vec<u8>) {
        self.streams.push(StreamFrame { text, pos: 0 });
        self.advance_within_streams();
    }

    /// True while any virtual stream is active.
    #[inline]
    pub fn in_virtual_stream(&self) -> bool {
        !self.streams.is_empty()
    }

    fn advance_within_streams(&mut self) {
        while let Some(frame) = self.streams.last_mut() {
            if let Some(b) = frame.next_byte() {
                self.current = b;
                return;
            }
            self.streams.pop();
        }
        self.current = match self.source.read_byte() {
            Ok(b) => b,
            Err(err) => {
                self.pending_error = Some(err);
                0
            }
        };
    }
}

impl xmltok_dtd::Cursor for Cursor {
    #[inline]
    fn current(&self) -> u8 {
        Cursor::current(self)
    }

    #[inline]
    fn advance(&mut self) -> u8 {
        Cursor::advance(self)
    }
}

/// Strips a leading UTF-8 BOM from `real`, if present, without affecting row
/// or column (the BOM is not part of the logical document).
fn real_with_bom_stripped(real: &mut RealSource) -> Result<RealSource> {
    match real {
        RealSource::Memory { data, pos: 0 } if data.starts_with(BOM) => {
            Ok(RealSource::Memory {
                data: data[BOM.len()..].to_vec(),
                pos: 0,
            })
        }
        RealSource::Memory { data, pos } => Ok(RealSource::Memory {
            data: std::mem::take(data),
            pos: *pos,
        }),
        RealSource::File { reader } => {
            let mut probe = [0u8; 3];
            let n = read_up_to(reader, &mut probe)?;
            if n == 3 && probe == *BOM {
                Ok(RealSource::File {
                    reader: std::mem::replace(reader, BufReader::new(tempfile_placeholder())),
                })
            } else {
                // Not a BOM (or a short file): put the bytes back by
                // wrapping them as a small in-memory prefix chained in
                // front of the remaining reader.
                Ok(RealSource::Memory {
                    data: {
                        let mut rest = Vec::new();
                        reader.read_to_end(&mut rest)?;
                        let mut all = probe[..n].to_vec();
                        all.extend(rest);
                        all
                    },
                    pos: 0,
                })
            }
        }
    }
}

fn read_up_to(reader: &mut BufReader<File>, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// A file handle is required to construct `RealSource::File`, but the BOM
/// probe above only needs it transiently when the probe *was* a BOM (in
/// which case the original reader, already advanced past the BOM, is moved
/// back in). This placeholder is never read from.
fn tempfile_placeholder() -> File {
    // SAFETY-free: we immediately overwrite this value in the caller; it
    // exists only so `std::mem::replace` has somewhere to put the old
    // reader while we hand it back out. On platforms without `/dev/null`
    // this would need a different trick, but every platform this crate
    // targets has one.
    File::open(if cfg!(windows) { "NUL" } else { "/dev/null" })
        .expect("platform null device must exist")
}
