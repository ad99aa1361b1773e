use serde::{Deserialize, Serialize};

use crate::{PipelineError, Result};

/// One contiguous time range of the source audio, half-open in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRange {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl ChunkRange {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }
}

/// Ordered, contiguous, non-overlapping ranges covering `[0, duration_ms)`,
/// each estimated to export under the service byte ceiling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    pub ranges: Vec<ChunkRange>,
}

impl ChunkPlan {
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// True for the degenerate "no split needed" plan
    pub fn is_single(&self) -> bool {
        self.ranges.len() == 1
    }
}

/// Compute the chunk plan for an audio file.
///
/// Pure and deterministic from its three inputs so it can be tested without
/// I/O. Assumes a constant bitrate across the file: the bytes-per-millisecond
/// rate is estimated as `total_bytes / duration_ms` and true exported chunk
/// sizes are not re-measured.
pub fn plan(total_bytes: u64, duration_ms: u64, byte_ceiling: u64) -> Result<ChunkPlan> {
    if total_bytes <= byte_ceiling {
        return Ok(ChunkPlan {
            ranges: vec![ChunkRange {
                start_ms: 0,
                end_ms: duration_ms,
            }],
        });
    }

    if duration_ms == 0 {
        return Err(PipelineError::Planning(format!(
            "{} bytes exceed the {} byte ceiling but the reported duration is zero",
            total_bytes, byte_ceiling
        ))
        .into());
    }

    // floor(byte_ceiling / bytes_per_ms) in integer arithmetic; u128 keeps the
    // intermediate product from overflowing for multi-hour files.
    let chunk_duration_ms =
        ((byte_ceiling as u128 * duration_ms as u128) / total_bytes as u128) as u64;

    if chunk_duration_ms == 0 {
        return Err(PipelineError::Planning(format!(
            "estimated bitrate too high to fit any audio under the {} byte ceiling",
            byte_ceiling
        ))
        .into());
    }

    let chunk_count = duration_ms.div_ceil(chunk_duration_ms);

    let ranges = (0..chunk_count)
        .map(|i| ChunkRange {
            start_ms: i * chunk_duration_ms,
            end_ms: ((i + 1) * chunk_duration_ms).min(duration_ms),
        })
        .collect();

    Ok(ChunkPlan { ranges })
}
