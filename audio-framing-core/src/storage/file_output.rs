use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::models::descriptor::PcmStreamDescriptor;
use crate::models::error::FramingError;
use crate::storage::wav_writer::StreamingWavWriter;

/// Create `dir/name` for writing, replacing any existing file.
///
/// Missing parent directories are created. The handle is opened read/write so
/// a WAV header can be rewritten through it after streaming.
pub fn create_output_file(dir: &Path, name: &str) -> Result<File, FramingError> {
    fs::create_dir_all(dir)
        .map_err(|e| FramingError::StorageError(format!("failed to create directory {}: {}", dir.display(), e)))?;

    let path = dir.join(name);
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(&path)
        .map_err(|e| FramingError::StorageError(format!("failed to create {}: {}", path.display(), e)))?;
    Ok(file)
}

/// Wrap an existing raw PCM capture in a WAV container.
///
/// Streams `pcm_path` into `wav_path` behind a header carrying its exact
/// length. Returns the payload byte count.
pub fn pcm_file_to_wav(pcm_path: &Path, wav_path: &Path, descriptor: PcmStreamDescriptor) -> Result<u64, FramingError> {
    let mut reader = BufReader::new(File::open(pcm_path)?);

    if let Some(parent) = wav_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = StreamingWavWriter::new(BufWriter::new(File::create(wav_path)?));
    writer.open(descriptor)?;

    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        writer.append_payload(&buf[..n])?;
    }

    let payload_bytes = writer.finalize()?;
    writer
        .into_inner()
        .into_inner()
        .map_err(|e| FramingError::Io(e.into_error()))?;
    log::info!(
        "wrapped {} as WAV ({} payload bytes) -> {}",
        pcm_path.display(),
        payload_bytes,
        wav_path.display()
    );
    Ok(payload_bytes)
}

/// Compute the SHA-256 hex digest of a file.
pub fn sha256_file(path: &Path) -> Result<String, FramingError> {
    let mut file = File::open(path)
        .map_err(|e| FramingError::StorageError(format!("failed to read file for checksum: {}", e)))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    use crate::processing::wav_format;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("audio_framing_test_{}_{}", name, std::process::id()))
    }

    #[test]
    fn create_output_file_makes_parents_and_truncates() {
        let dir = temp_dir("create").join("nested");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("take.wav"), b"stale contents").unwrap();

        let mut file = create_output_file(&dir, "take.wav").unwrap();
        file.write_all(b"new").unwrap();
        drop(file);

        assert_eq!(fs::read(dir.join("take.wav")).unwrap(), b"new");
        fs::remove_dir_all(temp_dir("create")).ok();
    }

    #[test]
    fn pcm_file_wraps_into_wav() {
        let dir = temp_dir("pcm_to_wav");
        fs::create_dir_all(&dir).unwrap();
        let pcm_path = dir.join("capture.pcm");
        let wav_path = dir.join("out").join("capture.wav");
        let pcm: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&pcm_path, &pcm).unwrap();

        let payload = pcm_file_to_wav(&pcm_path, &wav_path, PcmStreamDescriptor::pcm16(44100, 2)).unwrap();
        assert_eq!(payload, 200_000);

        let wav = fs::read(&wav_path).unwrap();
        assert_eq!(wav.len(), 200_044);
        assert_eq!(&wav[..44], &wav_format::encode(200_000, 44100, 2));
        assert_eq!(&wav[44..], &pcm[..]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_pcm_file_is_io_error() {
        let dir = temp_dir("missing");
        let err = pcm_file_to_wav(&dir.join("nope.pcm"), &dir.join("nope.wav"), PcmStreamDescriptor::default())
            .unwrap_err();
        assert!(matches!(err, FramingError::Io(_)));
    }

    #[test]
    fn checksum_of_known_content() {
        let dir = temp_dir("checksum");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("abc.bin");
        fs::write(&path, b"abc").unwrap();

        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        fs::remove_dir_all(&dir).ok();
    }
}
