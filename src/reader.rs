//! A reader that defers I/O errors so delimited protocol fields can be
//! parsed as straight-line code.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

/// Wraps a byte stream and latches the first read failure instead of
/// returning it from every call.
///
/// Protocol records with many small fields parse as a plain sequence of
/// reads, with a single error check at the end instead of one after every
/// field. The price is a hard contract: after the sequence the caller must
/// consult [`err`](Self::err) or [`finish`](Self::finish) before trusting
/// any parsed value, and must discard everything read when a failure is
/// latched.
///
/// Once latched, the error never resets and further reads return zero
/// values without touching the underlying stream again.
///
/// A `DeferredReader` serves one parsing flow at a time; the `&mut self`
/// receivers make concurrent use impossible.
pub struct DeferredReader<R> {
    inner: BufReader<R>,
    err: Option<io::Error>,
}

impl<R: AsyncRead + Unpin> DeferredReader<R> {
    /// Wrap a stream in a buffered deferred-error reader.
    pub fn new(stream: R) -> Self {
        Self {
            inner: BufReader::new(stream),
            err: None,
        }
    }

    /// Read bytes up to and including `delim`, returning the content with
    /// the delimiter stripped.
    ///
    /// Returns an empty string when this reader has already failed, when the
    /// stream ends before the delimiter, or when the bytes are not valid
    /// UTF-8. The failure is latched for [`err`](Self::err).
    pub async fn read_delimited(&mut self, delim: u8) -> String {
        if self.err.is_some() {
            return String::new();
        }
        let mut buf = Vec::new();
        match self.inner.read_until(delim, &mut buf).await {
            Ok(_) => {
                if buf.last() == Some(&delim) {
                    buf.pop();
                } else {
                    // stream ended before the delimiter
                    self.err = Some(io::ErrorKind::UnexpectedEof.into());
                    return String::new();
                }
                match String::from_utf8(buf) {
                    Ok(field) => field,
                    Err(err) => {
                        self.err = Some(io::Error::new(io::ErrorKind::InvalidData, err));
                        String::new()
                    }
                }
            }
            Err(err) => {
                self.err = Some(err);
                String::new()
            }
        }
    }

    /// Read a single byte, or zero when this reader has failed.
    pub async fn read_byte(&mut self) -> u8 {
        if self.err.is_some() {
            return 0;
        }
        match self.inner.read_u8().await {
            Ok(byte) => byte,
            Err(err) => {
                self.err = Some(err);
                0
            }
        }
    }

    /// The latched error, if any read so far has failed.
    pub fn err(&self) -> Option<&io::Error> {
        self.err.as_ref()
    }

    /// Consume the reader, yielding `Err` when any read in the sequence
    /// failed.
    pub fn finish(self) -> io::Result<()> {
        match self.err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
