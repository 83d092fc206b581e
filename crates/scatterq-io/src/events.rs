//! Select response event stream and chunk assembly.
//!
//! The remote query streams zero or more record frames followed by exactly one
//! stats frame (progress/continuation/end frames may be interleaved). Record
//! bytes are concatenated raw and decoded once, since a frame boundary can split
//! a multi-byte character.

use scatterq_core::error::{Error, Result};
use scatterq_core::types::{ChunkResult, ScanStats};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectEvent {
    Records(Vec<u8>),
    Stats(ScanStats),
    Progress(ScanStats),
    Continuation,
    End,
}

#[derive(Debug, Default)]
pub struct ChunkAssembler {
    payload: Vec<u8>,
    stats: Option<ScanStats>,
    frames: usize,
}

impl ChunkAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, event: SelectEvent) -> Result<()> {
        match event {
            SelectEvent::Records(bytes) => {
                self.frames += 1;
                self.payload.extend_from_slice(&bytes);
            }
            SelectEvent::Stats(stats) => {
                if self.stats.is_some() {
                    return Err(Error::Query {
                        key: key.to_string(),
                        reason: "duplicate stats frame".into(),
                    });
                }
                self.stats = Some(stats);
            }
            SelectEvent::Progress(_) | SelectEvent::Continuation | SelectEvent::End => {}
        }
        Ok(())
    }

    /// Number of record frames seen so far.
    pub fn record_frames(&self) -> usize {
        self.frames
    }

    pub fn finish(self, key: &str) -> Result<ChunkResult> {
        let stats = self.stats.ok_or_else(|| Error::Query {
            key: key.to_string(),
            reason: "response ended without a stats frame".into(),
        })?;
        let payload = String::from_utf8(self.payload).map_err(|e| Error::Query {
            key: key.to_string(),
            reason: format!("payload is not valid UTF-8: {e}"),
        })?;
        Ok(ChunkResult::new(payload, stats))
    }
}

/// Fold a full event sequence into a chunk.
pub fn assemble<I>(key: &str, events: I) -> Result<ChunkResult>
where
    I: IntoIterator<Item = SelectEvent>,
{
    let mut asm = ChunkAssembler::new();
    for ev in events {
        asm.push(key, ev)?;
    }
    asm.finish(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenates_interleaved_frames() {
        let stats = ScanStats::new(1, 2, 3);
        let chunk = assemble(
            "k",
            vec![
                SelectEvent::Records(b"{\"a\":1}\n".to_vec()),
                SelectEvent::Progress(ScanStats::new(1, 1, 0)),
                SelectEvent::Records(b"{\"a\":2}\n".to_vec()),
                SelectEvent::Continuation,
                SelectEvent::Stats(stats),
                SelectEvent::End,
            ],
        )
        .unwrap();
        assert_eq!(chunk.payload(), "{\"a\":1}\n{\"a\":2}\n");
        assert_eq!(chunk.stats(), stats);
    }

    #[test]
    fn zero_record_frames_yield_empty_payload() {
        let chunk = assemble("k", vec![SelectEvent::Stats(ScanStats::new(9, 9, 0))]).unwrap();
        assert_eq!(chunk.payload(), "");
        assert_eq!(chunk.stats().bytes_scanned, 9);
    }

    #[test]
    fn multibyte_split_across_frames() {
        let bytes = "héllo".as_bytes();
        let chunk = assemble(
            "k",
            vec![
                SelectEvent::Records(bytes[..2].to_vec()),
                SelectEvent::Records(bytes[2..].to_vec()),
                SelectEvent::Stats(ScanStats::default()),
            ],
        )
        .unwrap();
        assert_eq!(chunk.payload(), "héllo");
    }

    #[test]
    fn missing_or_duplicate_stats_fail() {
        let missing = assemble("k", vec![SelectEvent::Records(b"x".to_vec())]).unwrap_err();
        assert!(matches!(missing, Error::Query { ref key, .. } if key == "k"));

        let dup = assemble(
            "k",
            vec![
                SelectEvent::Stats(ScanStats::default()),
                SelectEvent::Stats(ScanStats::default()),
            ],
        )
        .unwrap_err();
        assert!(dup.to_string().contains("duplicate stats"));
    }
}
