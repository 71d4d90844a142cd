use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::config::RecordingConfiguration;
use crate::models::error::FramingError;
use crate::models::recording_result::{RecordingMetadata, RecordingResult};
use crate::models::state::SessionState;
use crate::storage::file_output;
use crate::storage::metadata::write_metadata;
use crate::storage::wav_writer::StreamingWavWriter;
use crate::traits::pcm_source::{PcmSource, SourceRead};

type FileWavWriter = StreamingWavWriter<BufWriter<File>>;

/// Status shared between the session and its producer thread.
struct SessionStatus {
    state: SessionState,
    payload_bytes: u64,
    chunks: u64,
}

/// Everything the producer thread drives while recording.
struct ProducerIo<S> {
    source: S,
    writer: FileWavWriter,
    mirror: Option<BufWriter<File>>,
}

impl<S: PcmSource> ProducerIo<S> {
    fn append(&mut self, chunk: &[u8]) -> Result<(), FramingError> {
        self.writer.append_payload(chunk)?;
        if let Some(mirror) = self.mirror.as_mut() {
            mirror.write_all(chunk)?;
        }
        Ok(())
    }
}

/// Holds the producer's I/O. The producer thread keeps it locked until it exits,
/// so the session only reads it after a join or a failed spawn.
type ProducerSlot<S> = Arc<Mutex<Option<ProducerIo<S>>>>;

type ProducerTask = Box<dyn FnOnce() -> Result<(), FramingError> + Send + 'static>;
type ProducerHandle = thread::JoinHandle<Result<(), FramingError>>;

fn spawn_producer_thread(task: ProducerTask) -> io::Result<ProducerHandle> {
    thread::Builder::new().name("pcm-producer".into()).spawn(task)
}

/// Output paths of the recording in progress.
struct ActiveRecording {
    config: RecordingConfiguration,
    wav_path: PathBuf,
    pcm_path: Option<PathBuf>,
}

/// Records one PCM source to a WAV file on a dedicated producer thread.
///
/// Data flow:
/// ```text
/// [PcmSource] → producer thread → [StreamingWavWriter] → {stem}.wav
///                                └→ optional raw mirror → {stem}.pcm
/// ```
///
/// The producer owns the source and writer while recording; `stop`/`finish`
/// join it before finalizing, so the header always reflects every appended
/// chunk.
pub struct RecordingSession<S: PcmSource + 'static> {
    source: Option<S>,
    status: Arc<Mutex<SessionStatus>>,
    stop_signal: Arc<AtomicBool>,
    producer_io: ProducerSlot<S>,
    producer_handle: Option<ProducerHandle>,
    active: Option<ActiveRecording>,
}

impl<S: PcmSource + 'static> RecordingSession<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Some(source),
            status: Arc::new(Mutex::new(SessionStatus {
                state: SessionState::Idle,
                payload_bytes: 0,
                chunks: 0,
            })),
            stop_signal: Arc::new(AtomicBool::new(false)),
            producer_io: Arc::new(Mutex::new(None)),
            producer_handle: None,
            active: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.status.lock().state
    }

    /// Payload bytes written so far in the current recording.
    pub fn payload_bytes(&self) -> u64 {
        self.status.lock().payload_bytes
    }

    /// Chunks appended so far in the current recording.
    pub fn chunks_written(&self) -> u64 {
        self.status.lock().chunks
    }

    /// Whether the producer has exited on its own (end of stream or failure).
    pub fn is_producer_finished(&self) -> bool {
        self.producer_handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Start recording. Transitions: idle/completed/failed → recording.
    pub fn start(&mut self, config: RecordingConfiguration) -> Result<(), FramingError> {
        self.start_with_spawner(config, spawn_producer_thread)
    }

    fn start_with_spawner<F>(&mut self, config: RecordingConfiguration, spawn: F) -> Result<(), FramingError>
    where
        F: FnOnce(ProducerTask) -> io::Result<ProducerHandle>,
    {
        let state = self.state();
        if state.is_recording() || state == SessionState::Stopping {
            return Err(FramingError::invalid_state("start", state));
        }
        config.validate().map_err(FramingError::ConfigurationFailed)?;

        let mut source = self
            .source
            .take()
            .ok_or_else(|| FramingError::invalid_state("start", SessionState::Failed))?;
        if source.descriptor() != config.descriptor {
            let message = format!(
                "source produces {:?} but configuration expects {:?}",
                source.descriptor(),
                config.descriptor
            );
            self.source = Some(source);
            return Err(FramingError::ConfigurationFailed(message));
        }

        let stem = config.resolve_file_stem();
        let wav_name = format!("{}.wav", stem);
        let wav_path = config.output_directory.join(&wav_name);

        let prepared = (|| -> Result<(FileWavWriter, Option<(PathBuf, BufWriter<File>)>), FramingError> {
            let file = file_output::create_output_file(&config.output_directory, &wav_name)?;
            let mut writer = StreamingWavWriter::new(BufWriter::new(file));
            writer.open(config.descriptor)?;

            let mirror = if config.mirror_raw_pcm {
                let pcm_name = format!("{}.pcm", stem);
                let file = file_output::create_output_file(&config.output_directory, &pcm_name)?;
                Some((config.output_directory.join(pcm_name), BufWriter::new(file)))
            } else {
                None
            };
            source.start()?;
            Ok((writer, mirror))
        })();

        let (writer, mirror) = match prepared {
            Ok(parts) => parts,
            Err(e) => {
                log::error!("Failed to start recording {}: {}", wav_path.display(), e);
                self.source = Some(source);
                self.set_state(SessionState::Failed);
                return Err(e);
            }
        };
        let (pcm_path, mirror) = match mirror {
            Some((path, file)) => (Some(path), Some(file)),
            None => (None, None),
        };

        {
            let mut s = self.status.lock();
            s.payload_bytes = 0;
            s.chunks = 0;
        }
        self.stop_signal.store(false, Ordering::SeqCst);

        *self.producer_io.lock() = Some(ProducerIo { source, writer, mirror });
        let slot = Arc::clone(&self.producer_io);
        let stop_signal = Arc::clone(&self.stop_signal);
        let status = Arc::clone(&self.status);
        let chunk_size = config.chunk_size_bytes;
        let poll_interval = config.poll_interval;

        let task: ProducerTask = Box::new(move || match slot.lock().as_mut() {
            Some(io) => run_producer(io, &stop_signal, &status, chunk_size, poll_interval),
            None => Ok(()),
        });
        let handle = match spawn(task) {
            Ok(handle) => handle,
            Err(e) => {
                log::error!("Failed to spawn producer for {}: {}", wav_path.display(), e);
                if let Some(mut io) = self.producer_io.lock().take() {
                    io.source.stop();
                    self.source = Some(io.source);
                }
                self.set_state(SessionState::Failed);
                return Err(FramingError::Io(e));
            }
        };

        log::info!("Recording started: {}", wav_path.display());
        self.producer_handle = Some(handle);
        self.active = Some(ActiveRecording {
            config,
            wav_path,
            pcm_path,
        });
        self.set_state(SessionState::Recording);
        Ok(())
    }

    /// Signal the producer to stop, then finalize the recording.
    /// Transitions: recording → stopping → completed/failed.
    pub fn stop(&mut self) -> Result<RecordingResult, FramingError> {
        self.complete("stop", true)
    }

    /// Wait for the source to reach end of stream, then finalize the recording.
    pub fn finish(&mut self) -> Result<RecordingResult, FramingError> {
        self.complete("finish", false)
    }

    fn complete(&mut self, operation: &'static str, signal_stop: bool) -> Result<RecordingResult, FramingError> {
        let state = self.state();
        if !state.is_recording() {
            return Err(FramingError::invalid_state(operation, state));
        }
        self.set_state(SessionState::Stopping);
        if signal_stop {
            self.stop_signal.store(true, Ordering::SeqCst);
        }

        match self.finalize_recording() {
            Ok(result) => {
                self.set_state(SessionState::Completed);
                Ok(result)
            }
            Err(e) => {
                log::error!("Recording failed: {}", e);
                self.set_state(SessionState::Failed);
                Err(e)
            }
        }
    }

    fn finalize_recording(&mut self) -> Result<RecordingResult, FramingError> {
        let active = self
            .active
            .take()
            .ok_or_else(|| FramingError::invalid_state("finalize", SessionState::Idle))?;
        let handle = self
            .producer_handle
            .take()
            .ok_or_else(|| FramingError::invalid_state("finalize", SessionState::Idle))?;

        let joined = handle.join();
        let mut io = self
            .producer_io
            .lock()
            .take()
            .ok_or_else(|| FramingError::StorageError("producer I/O lost".into()))?;
        io.source.stop();
        let ProducerIo {
            source,
            mut writer,
            mirror,
        } = io;
        self.source = Some(source);
        joined.map_err(|_| FramingError::StorageError("producer thread panicked".into()))??;

        let payload_bytes = writer.finalize()?;
        drop(writer);
        if let Some(mut mirror) = mirror {
            mirror.flush()?;
        }

        let checksum = file_output::sha256_file(&active.wav_path)?;
        let descriptor = active.config.descriptor;
        let metadata = RecordingMetadata::new(
            &active.wav_path.to_string_lossy(),
            &checksum,
            descriptor,
            payload_bytes,
        );
        if active.config.write_metadata_sidecar {
            write_metadata(&metadata, &active.wav_path)?;
        }

        log::info!(
            "Recording finished: {} ({} payload bytes)",
            active.wav_path.display(),
            payload_bytes
        );
        Ok(RecordingResult {
            wav_path: active.wav_path,
            pcm_path: active.pcm_path,
            payload_bytes,
            duration_secs: metadata.duration_secs,
            checksum,
            metadata,
        })
    }

    fn set_state(&self, new_state: SessionState) {
        let mut s = self.status.lock();
        log::debug!("Recording session: {} → {}", s.state, new_state);
        s.state = new_state;
    }
}

impl<S: PcmSource + 'static> Drop for RecordingSession<S> {
    fn drop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(handle) = self.producer_handle.take() {
            let _ = handle.join();
        }
    }
}

/// Producer loop: poll the source and append chunks until stopped or drained.
fn run_producer<S: PcmSource>(
    io: &mut ProducerIo<S>,
    stop_signal: &AtomicBool,
    status: &Mutex<SessionStatus>,
    chunk_size: usize,
    poll_interval: Duration,
) -> Result<(), FramingError> {
    let mut buf = vec![0u8; chunk_size];

    loop {
        if stop_signal.load(Ordering::SeqCst) {
            break Ok(());
        }
        match io.source.read_chunk(&mut buf) {
            Ok(SourceRead::Data(0)) | Ok(SourceRead::Pending) => thread::sleep(poll_interval),
            Ok(SourceRead::Data(n)) => {
                let n = n.min(buf.len());
                if let Err(e) = io.append(&buf[..n]) {
                    log::error!("Failed to write audio data: {}", e);
                    break Err(e);
                }
                let mut s = status.lock();
                s.payload_bytes += n as u64;
                s.chunks += 1;
            }
            Ok(SourceRead::EndOfStream) => {
                log::debug!("PCM source reached end of stream");
                break Ok(());
            }
            Err(e) => {
                log::error!("PCM source failed: {}", e);
                break Err(e.into());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    use approx::assert_relative_eq;

    use crate::models::descriptor::PcmStreamDescriptor;
    use crate::processing::pcm::convert_to_int16_pcm;
    use crate::processing::wav_format;
    use crate::storage::metadata::read_metadata;
    use crate::traits::pcm_source::MemoryPcmSource;

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
    }

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("audio_framing_session_{}_{}", name, std::process::id()))
    }

    fn config_for(dir: &Path, stem: &str) -> RecordingConfiguration {
        RecordingConfiguration {
            output_directory: dir.to_path_buf(),
            file_stem: Some(stem.into()),
            poll_interval: Duration::from_millis(1),
            ..Default::default()
        }
    }

    /// `[L0, R0, L1, R1, ...]`, padding the shorter channel with silence.
    fn interleave(left: &[f32], right: &[f32]) -> Vec<f32> {
        let frame_count = left.len().max(right.len());
        let mut stereo = Vec::with_capacity(frame_count * 2);
        for i in 0..frame_count {
            stereo.push(left.get(i).copied().unwrap_or(0.0));
            stereo.push(right.get(i).copied().unwrap_or(0.0));
        }
        stereo
    }

    /// Endless 440 Hz stereo tone, one chunk per poll.
    struct ToneSource {
        phase: f32,
    }

    impl PcmSource for ToneSource {
        fn descriptor(&self) -> PcmStreamDescriptor {
            PcmStreamDescriptor::pcm16(44100, 2)
        }

        fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<SourceRead> {
            let frames = buf.len() / 4;
            let mut left = Vec::with_capacity(frames);
            for _ in 0..frames {
                left.push((self.phase * std::f32::consts::TAU).sin() * 0.5);
                self.phase = (self.phase + 440.0 / 44100.0).fract();
            }
            let bytes = convert_to_int16_pcm(&interleave(&left, &left));
            buf[..bytes.len()].copy_from_slice(&bytes);
            thread::sleep(Duration::from_millis(1));
            Ok(SourceRead::Data(bytes.len()))
        }
    }

    /// Yields a few pending polls, some data, then fails.
    struct FlakySource {
        polls: usize,
    }

    impl PcmSource for FlakySource {
        fn descriptor(&self) -> PcmStreamDescriptor {
            PcmStreamDescriptor::default()
        }

        fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<SourceRead> {
            self.polls += 1;
            match self.polls {
                1..=3 => Ok(SourceRead::Pending),
                4 => {
                    buf[..16].fill(0x22);
                    Ok(SourceRead::Data(16))
                }
                _ => Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged")),
            }
        }
    }

    #[test]
    fn finish_records_whole_memory_source() {
        let dir = temp_dir("finish");
        let payload: Vec<u8> = (0..88_200u32).map(|i| (i % 200) as u8).collect();
        let source = MemoryPcmSource::new(PcmStreamDescriptor::pcm16(44100, 2), payload.clone());

        let mut session = RecordingSession::new(source);
        session.start(config_for(&dir, "half_second")).unwrap();
        assert_eq!(session.state(), SessionState::Recording);

        let result = session.finish().unwrap();
        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(result.payload_bytes, 88_200);
        assert_relative_eq!(result.duration_secs, 0.5);

        let wav = fs::read(&result.wav_path).unwrap();
        assert_eq!(wav.len(), 88_244);
        assert_eq!(u32_at(&wav, 40), 88_200);
        assert_eq!(u32_at(&wav, 4), 88_236);
        assert_eq!(&wav[44..], &payload[..]);
        assert_eq!(result.checksum, file_output::sha256_file(&result.wav_path).unwrap());

        let sidecar = read_metadata(&result.wav_path).unwrap();
        assert_eq!(sidecar, result.metadata);
        assert_eq!(sidecar.payload_bytes, 88_200);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn stop_finalizes_endless_source() {
        let dir = temp_dir("stop");
        let mut session = RecordingSession::new(ToneSource { phase: 0.0 });
        session.start(config_for(&dir, "tone")).unwrap();

        while session.chunks_written() < 3 {
            thread::sleep(Duration::from_millis(2));
        }
        let result = session.stop().unwrap();

        assert!(result.payload_bytes >= 3 * 4096);
        assert_eq!(result.payload_bytes % 4096, 0);
        assert_eq!(result.payload_bytes, session.payload_bytes());

        let wav = fs::read(&result.wav_path).unwrap();
        assert_eq!(wav.len() as u64, result.payload_bytes + 44);
        assert_eq!(wav_format::data_size(&wav), Some(result.payload_bytes as u32));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn raw_pcm_mirror_matches_wav_payload() {
        let dir = temp_dir("mirror");
        let payload = vec![0x3Cu8; 10_000];
        let source = MemoryPcmSource::new(PcmStreamDescriptor::default(), payload.clone());
        let config = RecordingConfiguration {
            mirror_raw_pcm: true,
            write_metadata_sidecar: false,
            ..config_for(&dir, "mirrored")
        };

        let mut session = RecordingSession::new(source);
        session.start(config).unwrap();
        let result = session.finish().unwrap();

        let pcm_path = result.pcm_path.clone().unwrap();
        assert_eq!(pcm_path, dir.join("mirrored.pcm"));
        assert_eq!(fs::read(&pcm_path).unwrap(), payload);
        assert!(!dir.join("mirrored.metadata.json").exists());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn source_failure_surfaces_from_stop() {
        let dir = temp_dir("flaky");
        let mut session = RecordingSession::new(FlakySource { polls: 0 });
        session.start(config_for(&dir, "flaky")).unwrap();

        while !session.is_producer_finished() {
            thread::sleep(Duration::from_millis(1));
        }
        let err = session.stop().unwrap_err();
        assert!(matches!(err, FramingError::Io(_)));
        assert_eq!(session.state(), SessionState::Failed);

        // The placeholder header was never rewritten.
        let wav = fs::read(dir.join("flaky.wav")).unwrap();
        assert_eq!(wav_format::data_size(&wav), Some(0));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn stop_without_start_is_invalid() {
        let mut session = RecordingSession::new(MemoryPcmSource::new(PcmStreamDescriptor::default(), Vec::new()));
        assert!(session.stop().unwrap_err().is_invalid_state());
        assert!(session.finish().unwrap_err().is_invalid_state());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn second_stop_is_invalid() {
        let dir = temp_dir("twice");
        let source = MemoryPcmSource::new(PcmStreamDescriptor::default(), vec![0; 64]);
        let mut session = RecordingSession::new(source);
        session.start(config_for(&dir, "twice")).unwrap();
        session.finish().unwrap();
        assert!(session.stop().unwrap_err().is_invalid_state());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn rejects_descriptor_mismatch() {
        let dir = temp_dir("mismatch");
        let source = MemoryPcmSource::new(PcmStreamDescriptor::pcm16(16000, 1), vec![0; 64]);
        let mut session = RecordingSession::new(source);

        let err = session.start(config_for(&dir, "mismatch")).unwrap_err();
        assert!(matches!(err, FramingError::ConfigurationFailed(_)));
        assert_eq!(session.state(), SessionState::Idle);

        let config = RecordingConfiguration {
            descriptor: PcmStreamDescriptor::pcm16(16000, 1),
            ..config_for(&dir, "mismatch")
        };
        session.start(config).unwrap();
        assert_eq!(session.finish().unwrap().payload_bytes, 64);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn session_can_record_again_after_completion() {
        let dir = temp_dir("again");
        let mut session = RecordingSession::new(MemoryPcmSource::new(PcmStreamDescriptor::default(), vec![1; 40]));

        session.start(config_for(&dir, "first")).unwrap();
        assert_eq!(session.finish().unwrap().payload_bytes, 40);

        // The drained source now reports end of stream immediately.
        session.start(config_for(&dir, "second")).unwrap();
        let result = session.finish().unwrap();
        assert_eq!(result.payload_bytes, 0);
        assert_eq!(fs::read(&result.wav_path).unwrap().len(), 44);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn spawn_failure_returns_source_to_session() {
        let dir = temp_dir("spawn");
        let source = MemoryPcmSource::new(PcmStreamDescriptor::default(), vec![5; 128]);
        let mut session = RecordingSession::new(source);

        let err = session
            .start_with_spawner(config_for(&dir, "no_thread"), |_| {
                Err(io::Error::new(io::ErrorKind::WouldBlock, "thread limit reached"))
            })
            .unwrap_err();
        assert!(matches!(err, FramingError::Io(_)));
        assert_eq!(session.state(), SessionState::Failed);
        assert!(session.stop().unwrap_err().is_invalid_state());

        let wav = fs::read(dir.join("no_thread.wav")).unwrap();
        assert_eq!(wav_format::data_size(&wav), Some(0));

        session.start(config_for(&dir, "retry")).unwrap();
        let result = session.finish().unwrap();
        assert_eq!(result.payload_bytes, 128);
        assert_eq!(session.state(), SessionState::Completed);

        fs::remove_dir_all(&dir).ok();
    }
}
