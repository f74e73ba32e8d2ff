//! Splicing pre-serialized XML fragments into an [`XmlWriter`].
//!
//! Metadata is often stored already serialized. [`copy_fragment`] copies such
//! a byte stream into the element currently open on the writer without parsing
//! it. Only the first [`LOOKAHEAD`] bytes are inspected, to drop a leading XML
//! declaration; the rest of the stream is transferred untouched.
//!
//! The lookahead buffer never cuts a multi-byte UTF-8 sequence in half before
//! decoding: the decoded prefix ends on a character boundary and the bytes
//! after it are written verbatim.

use std::io::{self, Read, Write};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use crate::error::{OaiError, Result};
use crate::xmlio::writer::XmlWriter;

/// Number of bytes inspected for an XML declaration.
pub const LOOKAHEAD: usize = 1024;

/// Longest possible incomplete UTF-8 tail (a 4-byte sequence missing its last byte).
const MAX_UTF8_TAIL: usize = 3;

lazy_static! {
    // Non-greedy so a following processing instruction is left alone.
    static ref XML_DECLARATION: Regex =
        Regex::new(r"(?s)\A<\?xml\s.*?\?>").expect("XML declaration pattern is valid");
}

/// Copies an XML fragment from `source` into the writer's current element.
///
/// A leading `<?xml ... ?>` declaration is removed if it lies within the first
/// [`LOOKAHEAD`] bytes; everything else is copied byte for byte. `source` is
/// consumed and dropped before this function returns, whatever the outcome.
///
/// # Errors
///
/// Returns [`OaiError::WriteFailure`] if reading the source or writing the
/// sink fails. The output is then incomplete and cannot be repaired.
///
/// # Examples
///
/// ```
/// use oaipmh::xmlio::{copy::copy_fragment, writer::XmlWriter};
///
/// let mut writer = XmlWriter::new(Vec::new());
/// writer.open_element("metadata")?;
/// copy_fragment(&b"<?xml version='1.0' encoding='UTF-8'?><dc>x</dc>"[..], &mut writer)?;
/// writer.close_element()?;
/// assert_eq!(writer.into_inner()?, b"<metadata><dc>x</dc></metadata>");
/// # Ok::<(), oaipmh::OaiError>(())
/// ```
pub fn copy_fragment<R: Read, W: Write>(mut source: R, writer: &mut XmlWriter<W>) -> Result<()> {
    let mut lookahead = vec![0u8; LOOKAHEAD];
    let filled = fill(&mut source, &mut lookahead).map_err(OaiError::WriteFailure)?;
    let buffer = &lookahead[..filled];

    let decodable = if filled < LOOKAHEAD {
        filled
    } else {
        complete_utf8_prefix_len(buffer)
    };
    let head = String::from_utf8_lossy(&buffer[..decodable]);
    let head = XML_DECLARATION.replace(&head, "");

    let sink = writer.raw()?;
    sink.write_all(head.as_bytes())
        .map_err(OaiError::WriteFailure)?;
    sink.write_all(&buffer[decodable..])
        .map_err(OaiError::WriteFailure)?;
    let rest = io::copy(&mut source, sink).map_err(OaiError::WriteFailure)?;

    trace!(
        lookahead = filled,
        decoded = decodable,
        streamed = rest,
        "copied XML fragment"
    );
    Ok(())
}

/// Length of the longest prefix of `bytes` that can be decoded without
/// splitting a multi-byte UTF-8 sequence.
///
/// Starts from all but the last three bytes and extends one byte at a time
/// while the prefix still ends inside an incomplete sequence. The bytes after
/// the returned length are never needed for decoding the prefix.
///
/// ```
/// use oaipmh::xmlio::copy::complete_utf8_prefix_len;
///
/// let heart = "test\u{2665}".as_bytes(); // 4 + 3 bytes
/// let cut = &heart[..heart.len() - 1];
/// let len = complete_utf8_prefix_len(cut);
/// assert!(std::str::from_utf8(&cut[..len]).is_ok());
/// ```
#[must_use]
pub fn complete_utf8_prefix_len(bytes: &[u8]) -> usize {
    let mut length = bytes.len().saturating_sub(MAX_UTF8_TAIL);
    while length < bytes.len() && ends_inside_sequence(&bytes[..length]) {
        length += 1;
    }
    length
}

fn ends_inside_sequence(bytes: &[u8]) -> bool {
    let window = bytes.len().saturating_sub(MAX_UTF8_TAIL)..bytes.len();
    let lead = window.rev().find(|&i| !is_continuation_byte(bytes[i]));
    match lead {
        Some(start) => matches!(
            std::str::from_utf8(&bytes[start..]),
            Err(e) if e.error_len().is_none()
        ),
        None => false,
    }
}

fn is_continuation_byte(byte: u8) -> bool {
    byte & 0b1100_0000 == 0b1000_0000
}

/// Reads until `buf` is full or the source is exhausted.
fn fill<R: Read>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {},
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
