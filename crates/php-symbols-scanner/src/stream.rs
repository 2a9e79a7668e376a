//! Feeding the scanner from byte sources.
//!
//! Readers hand out bytes in arbitrary pieces, so a multi-byte character may
//! be split between two reads. `Utf8Decoder` carries the incomplete tail over
//! to the next read; invalid sequences become U+FFFD, matching
//! `String::from_utf8_lossy` on the whole input.

use crate::error::ScanError;
use crate::options::ScanOptions;
use crate::scanner::{ScanReport, Scanner};
use std::io::{ErrorKind, Read};
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};

const REPLACEMENT: &str = "\u{FFFD}";

/// Incremental UTF-8 decoder for chunked byte input.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    carry: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes`, passing each decoded piece to `sink` in order.
    pub fn decode(&mut self, bytes: &[u8], mut sink: impl FnMut(&str)) {
        let joined;
        let mut rest: &[u8] = if self.carry.is_empty() {
            bytes
        } else {
            self.carry.extend_from_slice(bytes);
            joined = std::mem::take(&mut self.carry);
            &joined
        };

        loop {
            match std::str::from_utf8(rest) {
                Ok(s) => {
                    if !s.is_empty() {
                        sink(s);
                    }
                    return;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    if let Ok(s) = std::str::from_utf8(&rest[..valid]) {
                        if !s.is_empty() {
                            sink(s);
                        }
                    }
                    match e.error_len() {
                        Some(len) => {
                            sink(REPLACEMENT);
                            rest = &rest[valid + len..];
                        }
                        None => {
                            // Incomplete character at the end: wait for more bytes.
                            self.carry.extend_from_slice(&rest[valid..]);
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Flush a truncated trailing sequence at end of input.
    pub fn finish(self, mut sink: impl FnMut(&str)) {
        if !self.carry.is_empty() {
            sink(REPLACEMENT);
        }
    }
}

/// Scan everything `reader` produces.
///
/// Reads `options.chunk_size` bytes at a time and feeds each chunk to the
/// scanner before reading the next. A read error aborts the scan.
pub fn scan_reader<R: Read>(mut reader: R, options: &ScanOptions) -> Result<ScanReport, ScanError> {
    let mut scanner = Scanner::with_options(options);
    let mut decoder = Utf8Decoder::new();
    let mut buf = vec![0u8; options.effective_chunk_size()];

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(ScanError::Read(e)),
        };
        decoder.decode(&buf[..n], |s| scanner.feed(s));
    }
    decoder.finish(|s| scanner.feed(s));

    Ok(scanner.finish_report())
}

/// Async counterpart of [`scan_reader`].
///
/// The only await point is the next read; the scanner never holds more than
/// one chunk.
pub async fn scan_async_reader<R: AsyncRead + Unpin>(
    mut reader: R,
    options: &ScanOptions,
) -> Result<ScanReport, ScanError> {
    let mut scanner = Scanner::with_options(options);
    let mut decoder = Utf8Decoder::new();
    let mut buf = vec![0u8; options.effective_chunk_size()];

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(ScanError::Read(e)),
        };
        decoder.decode(&buf[..n], |s| scanner.feed(s));
    }
    decoder.finish(|s| scanner.feed(s));

    Ok(scanner.finish_report())
}

/// Open and scan a file.
pub fn scan_file(path: &Path, options: &ScanOptions) -> Result<ScanReport, ScanError> {
    let file = std::fs::File::open(path).map_err(|source| ScanError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    scan_reader(file, options)
}

/// Scan text that is already split into pieces.
pub fn scan_chunks<I, S>(chunks: I, options: &ScanOptions) -> ScanReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut scanner = Scanner::with_options(options);
    for chunk in chunks {
        scanner.feed(chunk.as_ref());
    }
    scanner.finish_report()
}
