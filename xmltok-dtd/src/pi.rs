//! Scanning of processing instructions, `<?target content?>`.

use crate::{Cursor, Unterminated};

/// Reads a processing instruction, given a cursor positioned on the first
/// byte of `target` (i.e. just after `<?`).
///
/// Bytes of the PI target are passed to `target_sink` until whitespace or
/// `?>` is seen; remaining bytes up to (but not including) the terminating
/// `?>` are passed to `content_sink`. On success the cursor is left one byte
/// past the closing `>`.
pub fn read_pi<C: Cursor>(
    cursor: &mut C,
    mut target_sink: impl FnMut(u8),
    mut content_sink: impl FnMut(u8),
) -> Result<(), Unterminated> {
    loop {
        match cursor.current() {
            0 => return Err(Unterminated),
            b'?' => break,
            b if is_xml_space(b) => break,
            b => {
                target_sink(b);
                cursor.advance();
            }
        }
    }
    skip_to_pi_end(cursor, &mut content_sink)
}

/// Skips (and optionally reports) the content of a PI, given a cursor
/// positioned right after the target (on whitespace, or directly on `?`).
pub fn skip_to_pi_end<C: Cursor>(
    cursor: &mut C,
    mut content_sink: impl FnMut(u8),
) -> Result<(), Unterminated> {
    let mut prev_was_question_mark = false;
    loop {
        match cursor.current() {
            0 => return Err(Unterminated),
            b'>' if prev_was_question_mark => {
                cursor.advance();
                return Ok(());
            }
            b => {
                if prev_was_question_mark {
                    content_sink(b'?');
                }
                prev_was_question_mark = b == b'?';
                if !prev_was_question_mark {
                    content_sink(b);
                }
                cursor.advance();
            }
        }
    }
}

#[inline]
fn is_xml_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::vec::Vec;

    struct SliceCursor<'a> {
        bytes: &'a [u8],
        pos: usize,
    }

    impl<'a> Cursor for SliceCursor<'a> {
        fn current(&self) -> u8 {
            self.bytes.get(self.pos).copied().unwrap_or(0)
        }

        fn advance(&mut self) -> u8 {
            if self.pos < self.bytes.len() {
                self.pos += 1;
            }
            self.current()
        }
    }

    fn run(input: &[u8]) -> Result<(Vec<u8>, Vec<u8>, usize), Unterminated> {
        let mut cursor = SliceCursor { bytes: input, pos: 0 };
        let mut target = Vec::new();
        let mut content = Vec::new();
        read_pi(&mut cursor, |b| target.push(b), |b| content.push(b))?;
        Ok((target, content, cursor.pos))
    }

    #[test]
    fn target_and_content() {
        // The separating whitespace between target and content is part of
        // "remaining bytes" and is not stripped here — callers that want a
        // single separator byte removed (as the PI content's leading
        // whitespace convention suggests) do that themselves.
        let (target, content, pos) = run(b"foo bar baz?>rest").unwrap();
        assert_eq!(target, b"foo");
        assert_eq!(content, b" bar baz");
        assert_eq!(pos, b"foo bar baz?>".len());
    }

    #[test]
    fn target_only() {
        let (target, content, pos) = run(b"foo?>rest").unwrap();
        assert_eq!(target, b"foo");
        assert_eq!(content, b"");
        assert_eq!(pos, b"foo?>".len());
    }

    #[test]
    fn content_with_lone_question_marks() {
        let (_, content, _) = run(b"t a ? b ?>x").unwrap();
        assert_eq!(content, b" a ? b ");
    }

    #[test]
    fn unterminated() {
        assert_eq!(run(b"foo bar"), Err(Unterminated));
    }
}
