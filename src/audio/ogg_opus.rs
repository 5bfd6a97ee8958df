//! Ogg Opus container reader: header parsing, stream totals, and
//! packet-by-packet decoding into caller-provided PCM blocks.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use ogg::reading::PacketReader;
use opus::{Channels, Decoder};

use super::byte_source::MemorySource;
use super::sample_source::{BlockRead, SampleSource};
use super::wave::OPUS_SAMPLE_RATE;
use crate::error::{Error, Result};

/// Identification header of an Ogg Opus stream (RFC 7845 section 5.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpusHead {
    pub version: u8,
    pub channels: u8,
    pub pre_skip: u16,
    pub input_sample_rate: u32,
    pub output_gain: i16,
    pub mapping_family: u8,
}

impl OpusHead {
    pub const MAGIC: &'static [u8; 8] = b"OpusHead";

    /// Parse the first packet of the stream.
    ///
    /// Accepts any version whose major nibble is zero, as required for
    /// forward compatibility.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 19 || &data[..8] != Self::MAGIC {
            return Err(Error::Unsupported("missing OpusHead packet".into()));
        }
        let version = data[8];
        if version >= 16 {
            return Err(Error::Unsupported(format!(
                "incompatible OpusHead version {version}"
            )));
        }
        let channels = data[9];
        if channels == 0 {
            return Err(Error::Unsupported("OpusHead reports zero channels".into()));
        }
        Ok(Self {
            version,
            channels,
            pre_skip: u16::from_le_bytes([data[10], data[11]]),
            input_sample_rate: u32::from_le_bytes([data[12], data[13], data[14], data[15]]),
            output_gain: i16::from_le_bytes([data[16], data[17]]),
            mapping_family: data[18],
        })
    }
}

const TAGS_MAGIC: &[u8; 8] = b"OpusTags";

/// Reads an Ogg Opus stream from any seekable byte source and decodes one
/// packet per [`SampleSource::read_block`] call.
pub struct OggOpusReader<R: Read + Seek> {
    packets: PacketReader<R>,
    decoder: Decoder,
    head: OpusHead,
    raw_total: u64,
    pcm_total: u64,
    skip_remaining: u32,
}

impl OggOpusReader<BufReader<File>> {
    /// Open a stream directly from the filesystem.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl OggOpusReader<MemorySource> {
    /// Open a stream from a complete in-memory file image.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::new(MemorySource::new(data))
    }
}

impl<R: Read + Seek> OggOpusReader<R> {
    /// Open a stream from any seekable byte source.
    ///
    /// Consumes the OpusHead and OpusTags header packets and computes the
    /// stream totals, leaving the reader positioned at the first audio
    /// packet.
    pub fn new(mut source: R) -> Result<Self> {
        let raw_total = source.seek(SeekFrom::End(0))?;
        let last_granule = scan_last_granule(&mut source, raw_total)?;
        source.seek(SeekFrom::Start(0))?;

        let mut packets = PacketReader::new(source);

        let head_packet = packets
            .read_packet()
            .map_err(|e| Error::Container(e.to_string()))?
            .ok_or_else(|| Error::Unsupported("stream has no packets".into()))?;
        let head = OpusHead::parse(&head_packet.data)?;

        if head.mapping_family != 0 {
            return Err(Error::Unsupported(format!(
                "channel mapping family {} not supported",
                head.mapping_family
            )));
        }
        let channels = match head.channels {
            1 => Channels::Mono,
            2 => Channels::Stereo,
            n => {
                return Err(Error::Unsupported(format!("{n} channels not supported")));
            }
        };

        let tags_packet = packets
            .read_packet()
            .map_err(|e| Error::Container(e.to_string()))?
            .ok_or_else(|| Error::Unsupported("stream ends before OpusTags".into()))?;
        if tags_packet.data.len() < TAGS_MAGIC.len() || &tags_packet.data[..8] != TAGS_MAGIC {
            return Err(Error::Unsupported("missing OpusTags packet".into()));
        }

        let decoder = Decoder::new(OPUS_SAMPLE_RATE, channels)?;

        Ok(Self {
            packets,
            decoder,
            head,
            raw_total,
            pcm_total: last_granule.saturating_sub(u64::from(head.pre_skip)),
            skip_remaining: u32::from(head.pre_skip),
        })
    }

    /// Identification header of the stream.
    pub fn head(&self) -> &OpusHead {
        &self.head
    }

    /// Total size of the underlying byte source in bytes.
    pub fn raw_total(&self) -> u64 {
        self.raw_total
    }

    /// Total PCM length of the stream in sample frames at 48 kHz, derived
    /// from the last page's granule position minus pre-skip.
    pub fn pcm_total(&self) -> u64 {
        self.pcm_total
    }

    fn next_block(&mut self, pcm: &mut [i16]) -> Result<BlockRead> {
        loop {
            let packet = match self.packets.read_packet() {
                Ok(Some(packet)) => packet,
                Ok(None) => return Ok(BlockRead::End),
                Err(e) => return Err(Error::Container(e.to_string())),
            };
            if packet.data.is_empty() {
                continue;
            }
            match self.decoder.decode(&packet.data, pcm, false) {
                Ok(0) => continue,
                Ok(frames) => {
                    let channels = usize::from(self.head.channels);
                    if self.skip_remaining > 0 {
                        let skip = (self.skip_remaining as usize).min(frames);
                        pcm.copy_within(skip * channels..frames * channels, 0);
                        self.skip_remaining -= skip as u32;
                        if frames == skip {
                            continue;
                        }
                        return Ok(BlockRead::Frames(frames - skip));
                    }
                    return Ok(BlockRead::Frames(frames));
                }
                Err(e) => {
                    log::warn!("undecodable packet of {} bytes: {}", packet.data.len(), e);
                    return Ok(BlockRead::Gap);
                }
            }
        }
    }
}

impl<R: Read + Seek> SampleSource for OggOpusReader<R> {
    fn channels(&self) -> u16 {
        u16::from(self.head.channels)
    }

    fn read_block(&mut self, pcm: &mut [i16]) -> Result<BlockRead> {
        self.next_block(pcm)
    }
}

/// Find the highest granule position among the Ogg pages in the stream tail.
///
/// Pages whose granule is -1 (packet spans the page) are ignored. Returns 0
/// when no page is found; the header parse will reject such a stream anyway.
fn scan_last_granule<R: Read + Seek>(source: &mut R, len: u64) -> Result<u64> {
    const TAIL_SCAN: u64 = 64 * 1024;

    let start = len.saturating_sub(TAIL_SCAN);
    source.seek(SeekFrom::Start(start))?;
    let mut tail = Vec::with_capacity((len - start) as usize);
    source.read_to_end(&mut tail)?;

    let mut best = 0i64;
    let mut i = 0usize;
    while i + 14 <= tail.len() {
        if &tail[i..i + 4] == b"OggS" {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&tail[i + 6..i + 14]);
            let granule = i64::from_le_bytes(raw);
            if granule > best {
                best = granule;
            }
            i += 4;
        } else {
            i += 1;
        }
    }
    Ok(best.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn page(granule: i64) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(b"OggS");
        v.extend_from_slice(&[0, 0]);
        v.extend_from_slice(&granule.to_le_bytes());
        v.extend_from_slice(&[0u8; 13]);
        v
    }

    #[test]
    fn scan_picks_highest_granule() {
        let mut data = Vec::new();
        for granule in [960, 1920, 23_040] {
            data.extend_from_slice(&page(granule));
        }
        let len = data.len() as u64;
        let mut cursor = Cursor::new(data);
        assert_eq!(scan_last_granule(&mut cursor, len).unwrap(), 23_040);
    }

    #[test]
    fn scan_ignores_spanning_pages() {
        let mut data = Vec::new();
        data.extend_from_slice(&page(4800));
        data.extend_from_slice(&page(-1));
        let len = data.len() as u64;
        let mut cursor = Cursor::new(data);
        assert_eq!(scan_last_granule(&mut cursor, len).unwrap(), 4800);
    }

    #[test]
    fn scan_of_garbage_is_zero() {
        let data = vec![0xABu8; 512];
        let len = data.len() as u64;
        let mut cursor = Cursor::new(data);
        assert_eq!(scan_last_granule(&mut cursor, len).unwrap(), 0);
    }
}
