use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

pub mod chunk;
pub mod planner;
pub mod whisper;

pub use chunk::{ChunkExporter, ChunkTranscriber, FfmpegExporter};
pub use planner::{plan, ChunkPlan, ChunkRange};
pub use whisper::{TranscriptionBackend, WhisperClient};

use crate::sources::AudioArtifact;
use crate::utils::{format_file_size, sanitize_filename};
use crate::Result;

/// On-disk transcript store keyed by episode identifier.
///
/// Concurrent requests for the same key are not coordinated; the write is
/// idempotent (same key, same content), so duplicated work is the only cost.
pub struct TranscriptCache {
    root: PathBuf,
}

impl TranscriptCache {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let key = sanitize_filename(key);
        self.root.join(&key).join(format!("{}.txt", key))
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if path.exists() {
            Ok(Some(fs_err::read_to_string(path)?))
        } else {
            Ok(None)
        }
    }

    pub fn put(&self, key: &str, text: &str) -> Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)?;
        }
        fs_err::write(path, text)?;
        Ok(())
    }
}

/// Drives the chunk planner and chunk transcriber into a single ordered
/// transcript, with an optional idempotent cache short-circuit.
pub struct TranscriptAssembler {
    chunker: ChunkTranscriber,
    cache: Option<TranscriptCache>,
}

impl TranscriptAssembler {
    pub fn new(chunker: ChunkTranscriber, cache: Option<TranscriptCache>) -> Self {
        Self { chunker, cache }
    }

    /// Produce the transcript for the whole artifact.
    ///
    /// Chunks are transcribed strictly sequentially in temporal order and
    /// concatenated with no added separators. Any chunk failure aborts the
    /// assembly; nothing partial is cached or returned.
    pub async fn get_transcript(&self, artifact: &AudioArtifact, cache_key: &str) -> Result<String> {
        if let Some(cache) = &self.cache {
            if let Some(text) = cache.get(cache_key)? {
                tracing::info!("Transcript already cached for {}", cache_key);
                return Ok(text);
            }
        }

        let ceiling = self.chunker.backend().max_payload_bytes();
        let plan = planner::plan(artifact.total_bytes, artifact.duration_ms, ceiling)?;

        let transcript = if plan.is_single() {
            tracing::info!(
                "Audio fits under the {} ceiling, transcribing directly",
                format_file_size(ceiling)
            );
            self.chunker.transcribe_whole(artifact).await?
        } else {
            tracing::info!(
                "Audio file is {} (ceiling {}), splitting into {} chunks",
                format_file_size(artifact.total_bytes),
                format_file_size(ceiling),
                plan.len()
            );

            let progress = ProgressBar::new(plan.len() as u64);
            progress.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks")
                    .unwrap(),
            );

            let mut text = String::new();
            for (i, range) in plan.ranges.iter().enumerate() {
                let chunk_text = self.chunker.transcribe_range(artifact, range).await?;
                text.push_str(&chunk_text);
                tracing::info!("Processed chunk {} of {}", i + 1, plan.len());
                progress.inc(1);
            }
            progress.finish_and_clear();
            text
        };

        if let Some(cache) = &self.cache {
            cache.put(cache_key, &transcript)?;
        }

        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::chunk::MockChunkExporter;
    use super::whisper::MockTranscriptionBackend;
    use super::*;
    use crate::sources::AudioFormat;
    use std::sync::{Arc, Mutex};

    const CEILING: u64 = 25_000_000;

    fn artifact(dir: &tempfile::TempDir, total_bytes: u64, duration_ms: u64) -> AudioArtifact {
        let path = dir.path().join("episode.mp3");
        std::fs::write(&path, b"not really mp3 bytes").unwrap();
        AudioArtifact {
            path,
            total_bytes,
            duration_ms,
            format: AudioFormat::Mp3,
        }
    }

    /// Exporter that writes a marker file and records every destination path
    fn recording_exporter(exported: Arc<Mutex<Vec<std::path::PathBuf>>>) -> MockChunkExporter {
        let mut exporter = MockChunkExporter::new();
        exporter.expect_export_range().returning(move |_, _, dest| {
            std::fs::write(dest, b"chunk bytes").unwrap();
            exported.lock().unwrap().push(dest.to_path_buf());
            Ok(())
        });
        exporter
    }

    /// Backend that answers each chunk with a marker derived from its start offset
    fn marker_backend(calls: usize) -> MockTranscriptionBackend {
        let mut backend = MockTranscriptionBackend::new();
        backend.expect_max_payload_bytes().return_const(CEILING);
        backend
            .expect_transcribe()
            .times(calls)
            .returning(|_, file_name, _| {
                let marker = match file_name.split('_').nth(1) {
                    Some("0") => "alpha. ",
                    Some("500000") => "bravo. ",
                    Some("1000000") => "charlie.",
                    other => panic!("unexpected chunk file {:?}", other),
                };
                Ok(marker.to_string())
            });
        backend
    }

    fn assembler(
        exporter: MockChunkExporter,
        backend: MockTranscriptionBackend,
        cache: Option<TranscriptCache>,
    ) -> TranscriptAssembler {
        let chunker = ChunkTranscriber::new(Arc::new(exporter), Arc::new(backend)).unwrap();
        TranscriptAssembler::new(chunker, cache)
    }

    #[tokio::test]
    async fn small_file_is_submitted_whole_without_export() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact(&dir, 10_000_000, 600_000);

        let mut exporter = MockChunkExporter::new();
        exporter.expect_export_range().times(0);

        let mut backend = MockTranscriptionBackend::new();
        backend.expect_max_payload_bytes().return_const(CEILING);
        backend
            .expect_transcribe()
            .times(1)
            .returning(|audio, file_name, mime| {
                assert_eq!(audio, b"not really mp3 bytes");
                assert_eq!(file_name, "episode.mp3");
                assert_eq!(mime, "audio/mpeg");
                Ok("full text".to_string())
            });

        let assembler = assembler(exporter, backend, None);
        let text = assembler.get_transcript(&artifact, "ep1").await.unwrap();
        assert_eq!(text, "full text");
    }

    #[tokio::test]
    async fn chunks_are_assembled_in_temporal_order() {
        let dir = tempfile::tempdir().unwrap();
        // 50 bytes/ms -> 3 chunks: [0,500000) [500000,1000000) [1000000,1200000)
        let artifact = artifact(&dir, 60_000_000, 1_200_000);

        let exported = Arc::new(Mutex::new(Vec::new()));
        let exporter = recording_exporter(exported.clone());
        let backend = marker_backend(3);

        let assembler = assembler(exporter, backend, None);
        let text = assembler.get_transcript(&artifact, "ep1").await.unwrap();

        assert_eq!(text, "alpha. bravo. charlie.");
        assert_eq!(exported.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn chunk_artifacts_are_deleted_after_assembly() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact(&dir, 60_000_000, 1_200_000);

        let exported = Arc::new(Mutex::new(Vec::new()));
        let exporter = recording_exporter(exported.clone());
        let backend = marker_backend(3);

        let assembler = assembler(exporter, backend, None);
        assembler.get_transcript(&artifact, "ep1").await.unwrap();

        for path in exported.lock().unwrap().iter() {
            assert!(!path.exists(), "chunk {} should be deleted", path.display());
        }
    }

    #[tokio::test]
    async fn cached_transcript_short_circuits_the_service() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let artifact = artifact(&dir, 60_000_000, 1_200_000);

        let exported = Arc::new(Mutex::new(Vec::new()));
        let exporter = recording_exporter(exported);
        // Exactly one set of service calls across both invocations
        let backend = marker_backend(3);

        let cache = TranscriptCache::new(cache_dir.path().to_path_buf());
        let assembler = assembler(exporter, backend, Some(cache));

        let first = assembler.get_transcript(&artifact, "ep1").await.unwrap();
        let second = assembler.get_transcript(&artifact, "ep1").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn chunk_failure_aborts_assembly_and_caches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = tempfile::tempdir().unwrap();
        let artifact = artifact(&dir, 60_000_000, 1_200_000);

        let exported = Arc::new(Mutex::new(Vec::new()));
        let exporter = recording_exporter(exported.clone());

        let mut backend = MockTranscriptionBackend::new();
        backend.expect_max_payload_bytes().return_const(CEILING);
        backend
            .expect_transcribe()
            .times(3)
            .returning(|_, file_name, _| match file_name.split('_').nth(1) {
                Some("1000000") => Err(crate::PipelineError::TranscriptionService(
                    "HTTP 500: boom".to_string(),
                )
                .into()),
                _ => Ok("ok ".to_string()),
            });

        let cache = TranscriptCache::new(cache_dir.path().to_path_buf());
        let assembler = assembler(exporter, backend, Some(cache));

        let err = assembler.get_transcript(&artifact, "ep1").await.unwrap_err();
        assert!(err.to_string().contains("Transcription service error"));

        // Nothing partial was cached
        let cache = TranscriptCache::new(cache_dir.path().to_path_buf());
        assert!(cache.get("ep1").unwrap().is_none());

        // Temporary artifacts of the completed chunks are gone too
        for path in exported.lock().unwrap().iter() {
            assert!(!path.exists(), "chunk {} should be deleted", path.display());
        }
    }

    #[tokio::test]
    async fn degenerate_metadata_is_a_planning_error() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact(&dir, 60_000_000, 0);

        let mut exporter = MockChunkExporter::new();
        exporter.expect_export_range().times(0);
        let mut backend = MockTranscriptionBackend::new();
        backend.expect_max_payload_bytes().return_const(CEILING);
        backend.expect_transcribe().times(0);

        let assembler = assembler(exporter, backend, None);
        let err = assembler.get_transcript(&artifact, "ep1").await.unwrap_err();
        assert!(err.to_string().contains("Chunk planning failed"));
    }

    #[test]
    fn cache_round_trips_text_under_a_key() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TranscriptCache::new(dir.path().to_path_buf());

        assert!(cache.get("ep1").unwrap().is_none());
        cache.put("ep1", "hello there").unwrap();
        assert_eq!(cache.get("ep1").unwrap().as_deref(), Some("hello there"));
    }
}
