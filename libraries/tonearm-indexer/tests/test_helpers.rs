//! Test helpers and fixtures for indexer integration tests
//!
//! Audio fixtures are tiny hand-assembled FLAC files: the stream marker, a
//! STREAMINFO block carrying real sample-rate/duration facts, and a Vorbis
//! comment block with the tags. Tag readers parse these like real files
//! without needing any audio frames.

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tonearm_indexer::{Engine, EngineConfig};

/// Open an engine backed by a fresh database in its own temp dir
///
/// The returned `TempDir` must outlive the engine.
pub async fn open_test_engine() -> (Engine, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_url = format!("sqlite://{}", temp_dir.path().join("library.db").display());

    let engine = Engine::open(EngineConfig::new(db_url).with_workers(2))
        .await
        .expect("Failed to open engine");

    (engine, temp_dir)
}

/// Write a minimal valid FLAC file with Vorbis comment tags
///
/// One second of 16-bit stereo 44.1 kHz audio is declared in STREAMINFO,
/// so the extractor reports a duration without any frames being present.
pub fn write_flac(
    path: &Path,
    title: &str,
    artist: &str,
    album: Option<&str>,
    genre: Option<&str>,
) {
    let mut data = Vec::new();
    data.extend_from_slice(b"fLaC");

    // STREAMINFO block (type 0, 34 bytes)
    data.extend_from_slice(&[0x00, 0x00, 0x00, 0x22]);
    data.extend_from_slice(&streaminfo());

    // VORBIS_COMMENT block (type 4), flagged as the last metadata block
    let comments = vorbis_comments(title, artist, album, genre);
    let len = comments.len() as u32;
    data.push(0x84);
    data.extend_from_slice(&[
        ((len >> 16) & 0xFF) as u8,
        ((len >> 8) & 0xFF) as u8,
        (len & 0xFF) as u8,
    ]);
    data.extend_from_slice(&comments);

    fs::write(path, data).expect("Failed to write flac fixture");
}

/// STREAMINFO body: 4096-sample blocks, 44.1 kHz, stereo, 16 bps,
/// 44100 total samples (one second), zeroed MD5
fn streaminfo() -> [u8; 34] {
    let mut info = [0u8; 34];
    info[0..2].copy_from_slice(&4096u16.to_be_bytes()); // min block size
    info[2..4].copy_from_slice(&4096u16.to_be_bytes()); // max block size
    // bytes 4..10: min/max frame size, unknown (0)
    // 20 bits sample rate, 3 bits channels-1, 5 bits bps-1, 36 bits samples
    let sample_rate: u32 = 44_100;
    let total_samples: u64 = 44_100;
    info[10] = (sample_rate >> 12) as u8;
    info[11] = (sample_rate >> 4) as u8;
    info[12] = (((sample_rate & 0xF) << 4) as u8) | (1 << 1); // 2 channels, bps high bit 0
    info[13] = 0xF0 | (((total_samples >> 32) & 0xF) as u8); // 16 bps
    info[14..18].copy_from_slice(&(total_samples as u32).to_be_bytes());
    // bytes 18..34: MD5 of the (absent) audio, left zeroed
    info
}

fn vorbis_comments(
    title: &str,
    artist: &str,
    album: Option<&str>,
    genre: Option<&str>,
) -> Vec<u8> {
    let vendor = b"tonearm";
    let mut fields: Vec<String> = vec![
        format!("TITLE={title}"),
        format!("ARTIST={artist}"),
        "TRACKNUMBER=1".to_string(),
    ];
    if let Some(album) = album {
        fields.push(format!("ALBUM={album}"));
    }
    if let Some(genre) = genre {
        fields.push(format!("GENRE={genre}"));
    }

    let mut block = Vec::new();
    block.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    block.extend_from_slice(vendor);
    block.extend_from_slice(&(fields.len() as u32).to_le_bytes());
    for field in &fields {
        block.extend_from_slice(&(field.len() as u32).to_le_bytes());
        block.extend_from_slice(field.as_bytes());
    }
    block
}
