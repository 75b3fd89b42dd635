use bdc_types::{DIGEST_SIZE, Record, RecordDigest};
use bdc_wire::header::HEADER_SIZE;
use bdc_wire::varint::{MAX_VARINT_BYTES, decode_varint};
use bdc_wire::{CapsuleHeader, Trailer, WireError};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use crate::config::DecoderConfig;
use crate::decoder::{frame_len, verify};
use crate::error::DecodeError;
use crate::frame::FrameDecoder;

/// Events emitted by the streaming decoder.
///
/// ```text
///   Header(CapsuleHeader)
///   Frame { index: 0, records }
///   Frame { index: 1, records }
///   ...
///   Verified { samples }          ← capsule has a checksum and it matched
///   (stream ends)
/// ```
///
/// With checksum verification turned off, a capsule that carries a
/// trailer ends with [`DecoderEvent::Trailer`] instead.
#[derive(Clone, Debug)]
pub enum DecoderEvent {
  /// The capsule header has been read and validated.
  Header(CapsuleHeader),

  /// One frame has been fully decompressed.
  Frame { index: usize, records: Vec<Record> },

  /// The trailer matched every record emitted so far.
  Verified { samples: u64 },

  /// The trailer was read but not compared with the records.
  Trailer { samples: u64 },
}

/// Asynchronous capsule decoder that yields one frame at a time.
///
/// Frames are read from any `AsyncRead` source (a file, a socket, a BLE
/// bridge) and decompressed as soon as their bytes are in. Only one
/// frame body is buffered at a time; the checksum is accumulated over the
/// records as they are emitted and checked once the trailer arrives.
///
/// Records from a frame are handed out before the trailer has been
/// checked. A consumer that needs verified data should hold them until
/// [`DecoderEvent::Verified`] (or use [`CapsuleDecoder`](crate::CapsuleDecoder)).
///
/// # Example
///
/// ```rust,no_run
/// use bdc_decoder::{DecoderEvent, StreamingDecoder};
/// use tokio::io::AsyncRead;
///
/// async fn count_samples(reader: impl AsyncRead + Unpin) -> usize {
///     let mut stream = StreamingDecoder::new(reader);
///     let mut total = 0;
///     while let Some(event) = stream.next().await.transpose().unwrap() {
///         if let DecoderEvent::Frame { records, .. } = event {
///             total += records.len();
///         }
///     }
///     total
/// }
/// ```
pub struct StreamingDecoder<R> {
  reader: R,
  state: StreamState,
  config: DecoderConfig,
  frames: FrameDecoder,
  digest: RecordDigest,
  has_checksum: bool,
  index: usize,
  /// Bytes consumed from the reader, for error offsets.
  offset: usize,
  /// Frame body buffer, reused across frames.
  buf: Vec<u8>,
}

/// ```text
///   ReadHeader → ReadFrames → CheckTrailing → Done
/// ```
///
/// `CheckTrailing` is entered right after the trailer event has been
/// returned, so a source that stays open (a live link) still delivers
/// the verdict. Any error also moves the decoder to `Done`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StreamState {
  ReadHeader,
  ReadFrames,
  CheckTrailing,
  Done,
}

/// Upper bound on the read that looks for bytes after the capsule.
const TRAILING_PEEK_LEN: usize = 64;

impl<R: AsyncRead + Unpin> StreamingDecoder<R> {
  #[must_use]
  pub fn new(reader: R) -> Self {
    Self::with_config(reader, DecoderConfig::default())
  }

  #[must_use]
  pub fn with_config(reader: R, config: DecoderConfig) -> Self {
    Self {
      reader,
      state: StreamState::ReadHeader,
      frames: FrameDecoder::with_config(config.clone()),
      config,
      digest: RecordDigest::new(),
      has_checksum: false,
      index: 0,
      offset: 0,
      buf: Vec::with_capacity(256),
    }
  }

  /// Read the next event from the stream.
  ///
  /// Returns `Some(Ok(event))` for each event, `None` once the capsule
  /// has been fully consumed, or `Some(Err(_))` on a decode error, after
  /// which the stream is finished.
  pub async fn next(&mut self) -> Option<Result<DecoderEvent, DecodeError>> {
    let result = match self.state {
      StreamState::ReadHeader => self.read_header().await.map(Some),
      StreamState::ReadFrames => self.read_next_frame().await,
      StreamState::CheckTrailing => self.check_trailing().await.map(|()| None),
      StreamState::Done => return None,
    };

    if result.is_err() {
      self.state = StreamState::Done;
    }
    result.transpose()
  }

  /// Records emitted so far.
  #[must_use]
  pub fn samples(&self) -> u64 {
    self.digest.count()
  }

  async fn read_header(&mut self) -> Result<DecoderEvent, DecodeError> {
    let mut header_buf = [0u8; HEADER_SIZE];
    let n = self.read_fill(&mut header_buf).await?;
    if n == 0 {
      return Err(DecodeError::EmptyInput);
    }
    if n < HEADER_SIZE {
      return Err(DecodeError::InvalidHeader(WireError::UnexpectedEof {
        offset: n,
      }));
    }

    let header = CapsuleHeader::read_from(&header_buf).map_err(DecodeError::InvalidHeader)?;
    debug!(flags = header.flags.raw(), "streaming capsule header");

    self.has_checksum = header.flags.has_checksum();
    self.state = StreamState::ReadFrames;
    Ok(DecoderEvent::Header(header))
  }

  /// Read and decode the next frame. At the end-of-frames marker, read
  /// the trailer instead.
  async fn read_next_frame(&mut self) -> Result<Option<DecoderEvent>, DecodeError> {
    let Some(len) = self.read_varint().await? else {
      return Err(DecodeError::MissingEndMarker);
    };

    if len == 0 {
      return self.finish().await;
    }

    let len = frame_len(len, self.offset)?;
    self.buf.clear();
    self.buf.resize(len, 0);
    let n = self.read_fill_buf(len).await?;
    if n < len {
      return Err(DecodeError::Wire(WireError::UnexpectedEof {
        offset: self.offset,
      }));
    }

    let records = self.frames.decode(&self.buf)?;
    self.digest.update_all(&records);

    let index = self.index;
    self.index += 1;
    debug!(index, len, samples = records.len(), "streamed frame");
    Ok(Some(DecoderEvent::Frame { index, records }))
  }

  /// Handle the end-of-frames marker. A capsule with a trailer reports
  /// it and leaves the trailing-data check for the next call; one
  /// without has nothing to report, so the check runs now.
  async fn finish(&mut self) -> Result<Option<DecoderEvent>, DecodeError> {
    self.state = StreamState::CheckTrailing;
    if !self.has_checksum {
      self.check_trailing().await?;
      return Ok(None);
    }

    let trailer = self.read_trailer().await?;
    let samples = trailer.sample_count;
    if self.config.verify_checksum {
      verify(&trailer, &self.digest)?;
      Ok(Some(DecoderEvent::Verified { samples }))
    } else {
      Ok(Some(DecoderEvent::Trailer { samples }))
    }
  }

  /// One bounded read past the end of the capsule. EOF ends the stream;
  /// anything else is trailing data. `extra_bytes` counts what that read
  /// returned, so it is a lower bound.
  async fn check_trailing(&mut self) -> Result<(), DecodeError> {
    let mut peek = [0u8; TRAILING_PEEK_LEN];
    let n = self.reader.read(&mut peek).await?;
    self.state = StreamState::Done;
    if n > 0 {
      return Err(DecodeError::TrailingData { extra_bytes: n });
    }
    Ok(())
  }

  async fn read_trailer(&mut self) -> Result<Trailer, DecodeError> {
    let eof = WireError::UnexpectedEof {
      offset: self.offset,
    };
    let sample_count = self.read_varint().await?.ok_or(eof)?;

    let mut checksum = [0u8; DIGEST_SIZE];
    if self.read_fill(&mut checksum).await? < DIGEST_SIZE {
      return Err(DecodeError::Wire(WireError::UnexpectedEof {
        offset: self.offset,
      }));
    }

    Ok(Trailer {
      sample_count,
      checksum,
    })
  }

  /// Read one varint byte by byte. `Ok(None)` when the reader is at EOF
  /// before the first byte.
  async fn read_varint(&mut self) -> Result<Option<u64>, DecodeError> {
    let mut varint_buf = [0u8; MAX_VARINT_BYTES];
    let mut len = 0;

    loop {
      let mut byte = [0u8; 1];
      if self.read_fill(&mut byte).await? == 0 {
        if len == 0 {
          return Ok(None);
        }
        return Err(DecodeError::Wire(WireError::UnexpectedEof {
          offset: self.offset,
        }));
      }
      varint_buf[len] = byte[0];
      len += 1;

      if byte[0] & 0x80 == 0 {
        break;
      }
      if len >= MAX_VARINT_BYTES {
        return Err(DecodeError::Wire(WireError::VarintTooLong));
      }
    }

    let (value, _) = decode_varint(&varint_buf[..len])?;
    Ok(Some(value))
  }

  /// Fill `buf` unless EOF comes first; returns the bytes read.
  async fn read_fill(&mut self, buf: &mut [u8]) -> Result<usize, DecodeError> {
    let mut filled = 0;
    while filled < buf.len() {
      let n = self.reader.read(&mut buf[filled..]).await?;
      if n == 0 {
        break;
      }
      filled += n;
    }
    self.offset += filled;
    Ok(filled)
  }

  /// [`read_fill`](Self::read_fill) into the first `len` bytes of the
  /// frame buffer.
  async fn read_fill_buf(&mut self, len: usize) -> Result<usize, DecodeError> {
    let mut filled = 0;
    while filled < len {
      let n = self.reader.read(&mut self.buf[filled..len]).await?;
      if n == 0 {
        break;
      }
      filled += n;
    }
    self.offset += filled;
    Ok(filled)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use bdc_encoder::CapsuleEncoder;
  use bdc_types::TEMPERATURE_INVALID;
  use std::time::Duration;
  use tokio::io::AsyncWriteExt;

  fn sample_records() -> Vec<Record> {
    let mut records: Vec<Record> = (0..40)
      .map(|i| Record::new(10_000 + i * 30, 3600 + i16::try_from(i % 7).unwrap()))
      .collect();
    records[12] = Record::unreceived();
    records[13] = Record::unreceived();
    records[20] = Record::new(10_600, TEMPERATURE_INVALID);
    records
  }

  fn encode(checksum: bool) -> Vec<u8> {
    let mut enc = CapsuleEncoder::new();
    enc
      .period(30)
      .frame_capacity(20)
      .checksum(checksum)
      .add_records(sample_records());
    enc.encode().unwrap()
  }

  async fn collect(bytes: Vec<u8>) -> Vec<Result<DecoderEvent, DecodeError>> {
    let reader = tokio::io::BufReader::new(std::io::Cursor::new(bytes));
    let mut decoder = StreamingDecoder::new(reader);
    let mut events = Vec::new();
    while let Some(result) = decoder.next().await {
      events.push(result);
    }
    events
  }

  fn records_of(events: &[Result<DecoderEvent, DecodeError>]) -> Vec<Record> {
    events
      .iter()
      .filter_map(|e| match e {
        Ok(DecoderEvent::Frame { records, .. }) => Some(records.clone()),
        _ => None,
      })
      .flatten()
      .collect()
  }

  #[tokio::test]
  async fn header_frames_then_verified() {
    let events = collect(encode(true)).await;

    assert!(matches!(&events[0], Ok(DecoderEvent::Header(h)) if h.flags.has_checksum()));
    assert!(matches!(&events[1], Ok(DecoderEvent::Frame { index: 0, .. })));
    assert!(matches!(events.last(), Some(Ok(DecoderEvent::Verified { samples: 40 }))));
    assert!(events.iter().all(Result::is_ok));
    assert_eq!(records_of(&events), sample_records());
  }

  #[tokio::test]
  async fn matches_sync_decoder() {
    let bytes = encode(true);
    let sync = crate::CapsuleDecoder::decode(&bytes).unwrap();
    let events = collect(bytes).await;

    let frames = events
      .iter()
      .filter(|e| matches!(e, Ok(DecoderEvent::Frame { .. })))
      .count();
    assert_eq!(frames, sync.frames.len());
    assert_eq!(records_of(&events), sync.records);
  }

  #[tokio::test]
  async fn no_checksum_ends_without_verified() {
    let events = collect(encode(false)).await;
    assert!(matches!(events.last(), Some(Ok(DecoderEvent::Frame { .. }))));
    assert_eq!(records_of(&events), sample_records());
  }

  #[tokio::test]
  async fn corrupt_checksum_is_reported_last() {
    let mut bytes = encode(true);
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    let events = collect(bytes).await;

    assert!(matches!(
      events.last(),
      Some(Err(DecodeError::ChecksumMismatch { .. }))
    ));
    assert_eq!(records_of(&events), sample_records());
  }

  #[tokio::test]
  async fn unverified_mode_accepts_corrupt_checksum() {
    let mut bytes = encode(true);
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;

    let config = DecoderConfig {
      verify_checksum: false,
      ..DecoderConfig::default()
    };
    let mut decoder = StreamingDecoder::with_config(bytes.as_slice(), config);
    let mut last_event = None;
    while let Some(event) = decoder.next().await {
      last_event = Some(event.unwrap());
    }
    assert!(matches!(last_event, Some(DecoderEvent::Trailer { samples: 40 })));
    assert_eq!(decoder.samples(), 40);
  }

  #[tokio::test]
  async fn verified_while_source_stays_open() {
    let bytes = encode(true);
    let (mut tx, rx) = tokio::io::duplex(4096);
    tx.write_all(&bytes).await.unwrap();

    // tx stays alive: the reader never sees EOF
    let mut decoder = StreamingDecoder::new(rx);
    let mut verified = None;
    loop {
      let event = tokio::time::timeout(Duration::from_millis(500), decoder.next())
        .await
        .expect("decoder stalled on an open source")
        .unwrap()
        .unwrap();
      if let DecoderEvent::Verified { samples } = event {
        verified = Some(samples);
        break;
      }
    }
    assert_eq!(verified, Some(40));

    // closing the link ends the stream cleanly
    drop(tx);
    assert!(decoder.next().await.is_none());
    assert!(decoder.next().await.is_none());
  }

  #[tokio::test]
  async fn bytes_after_trailer_on_open_source() {
    let bytes = encode(true);
    let (mut tx, rx) = tokio::io::duplex(4096);
    tx.write_all(&bytes).await.unwrap();

    let mut decoder = StreamingDecoder::new(rx);
    while let Some(event) = decoder.next().await {
      if matches!(event.unwrap(), DecoderEvent::Verified { .. }) {
        break;
      }
    }

    tx.write_all(b"next capsule").await.unwrap();
    assert!(matches!(
      decoder.next().await,
      Some(Err(DecodeError::TrailingData { extra_bytes: 12 }))
    ));
    assert!(decoder.next().await.is_none());
  }

  #[tokio::test]
  async fn truncated_stream() {
    let mut bytes = encode(false);
    // drop the end marker
    bytes.pop();
    let events = collect(bytes).await;
    assert!(matches!(events.last(), Some(Err(DecodeError::MissingEndMarker))));
  }

  #[tokio::test]
  async fn trailing_bytes() {
    let mut bytes = encode(true);
    bytes.extend_from_slice(b"xyz");
    let events = collect(bytes).await;
    assert!(matches!(
      events.last(),
      Some(Err(DecodeError::TrailingData { extra_bytes: 3 }))
    ));
  }

  #[tokio::test]
  async fn empty_and_short_input() {
    let events = collect(Vec::new()).await;
    assert!(matches!(events.as_slice(), [Err(DecodeError::EmptyInput)]));

    let events = collect(b"BDC".to_vec()).await;
    assert!(matches!(
      events.as_slice(),
      [Err(DecodeError::InvalidHeader(WireError::UnexpectedEof { offset: 3 }))]
    ));
  }

  #[tokio::test]
  async fn stops_after_error() {
    let mut decoder = StreamingDecoder::new(&b"NOPE\x01\x00\x00\x00"[..]);
    assert!(matches!(
      decoder.next().await,
      Some(Err(DecodeError::InvalidHeader(WireError::InvalidMagic { .. })))
    ));
    assert!(decoder.next().await.is_none());
  }
}
