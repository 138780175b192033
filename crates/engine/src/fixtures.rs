// Generated media for tests

use std::path::{Path, PathBuf};

/// Write a mono 16-bit PCM WAV file of silence
pub fn write_silent_wav(path: &Path, sample_rate: u32, duration_ms: u64) -> std::io::Result<()> {
    let frames = sample_rate as u64 * duration_ms / 1000;
    let data_len = (frames * 2) as u32;

    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.resize(44 + data_len as usize, 0);

    std::fs::write(path, bytes)
}

/// Per-process path in the temp directory
pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("liteplay-{}-{}", std::process::id(), name))
}
