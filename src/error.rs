//! Error management module.

use std::fmt;
use std::io;
use std::str::Utf8Error;

/// A 1-based source position, as reported on every event (successful or not).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Position {
    /// 1-based row (line) number.
    pub row: u64,
    /// 1-based column number.
    pub col: u64,
}

impl Position {
    pub(crate) const fn start() -> Self {
        Position { row: 1, col: 1 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.col)
    }
}

/// An error produced while tokenizing an XML document or loading a DTD.
///
/// All variants are fatal for the document being parsed: there is no
/// recoverable error in this tokenizer, matching the source grammar's own
/// all-or-nothing well-formedness contract.
#[derive(Debug)]
pub enum Error {
    /// Failure reading the underlying source (a DTD file, or a file-backed
    /// document source).
    Io(io::Error),
    /// The source (or a DTD file) contained bytes that are not valid UTF-8.
    Utf8(Utf8Error),
    /// A syntactically invalid token was found (§7 "invalid token").
    InvalidToken(String),
    /// A malformed `<?xml ...?>` declaration (§7 "bad XML declaration").
    BadXmlDecl(String),
    /// An unresolvable entity reference in content (§7 "bad entity").
    BadEntity(String),
    /// `</x>` did not match the top of the tag stack (§7 "mismatched tag").
    MismatchedTag {
        /// The name the parser expected to close.
        expected: String,
        /// The name actually found in the end-tag.
        found: String,
    },
    /// End of input reached with a non-empty tag stack (§7 "missing end tag").
    MissingEndTag(String),
    /// A namespace prefix was used but never bound (§7 "invalid namespace").
    InvalidNamespace(String),
    /// A second `<!DOCTYPE ...>` was found in the same document.
    DuplicateDoctype,
    /// Any failure while parsing a DTD subset or loading an external DTD.
    Dtd(String),
}

/// A specialized `Result` type where the error is hard-wired to [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Utf8(err) => write!(f, "UTF-8 error: {}", err),
            Error::InvalidToken(msg) => write!(f, "not well-formed (invalid token): {}", msg),
            Error::BadXmlDecl(msg) => write!(f, "bad XML declaration: {}", msg),
            Error::BadEntity(msg) => write!(f, "error parsing entity reference: {}", msg),
            Error::MismatchedTag { expected, found } => {
                write!(f, "expected </{}>, found </{}>", expected, found)
            }
            Error::MissingEndTag(name) => write!(f, "expected end tag for <{}> is missing", name),
            Error::InvalidNamespace(prefix) => {
                write!(f, "unbound namespace prefix '{}'", prefix)
            }
            Error::DuplicateDoctype => write!(f, "duplicate DOCTYPE declaration"),
            Error::Dtd(msg) => write!(f, "DTD error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Utf8(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<Utf8Error> for Error {
    fn from(err: Utf8Error) -> Error {
        Error::Utf8(err)
    }
}

/// A fatal error, paired with the position of its first byte in the source.
///
/// This is the payload of [`crate::events::Event::Error`] — the parser's
/// next-event channel is the only way errors are surfaced (§7: "the parser
/// does not log; host bindings choose user-visible formatting").
#[derive(Debug)]
pub struct PositionedError {
    /// The underlying error.
    pub error: Error,
    /// Where in the source the error was detected.
    pub position: Position,
}

impl fmt::Display for PositionedError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} at {}", self.error, self.position)
    }
}
