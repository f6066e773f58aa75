//! Corruption Accounting Tests
//!
//! Damaged files must never crash the reader. Every failure is reported
//! as a loss estimate equal to the bytes from the start of the failing
//! frame to the end of the file.
//! - Oversized length prefix
//! - Payload shorter than declared (torn write)
//! - Torn length prefix
//! - Reader trailing a writer

use framestore::frame::encode_length;
use framestore::store::{
    FramedFile, LossReason, ReadOutcome, RecordReplayer, StoreConfig, LOSS_SENTINEL,
};
use std::fs;
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn create_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

fn write_records(path: &std::path::Path, payloads: &[&[u8]]) {
    let mut file = FramedFile::new(path, true);
    file.open_append().unwrap();
    for payload in payloads {
        file.append_record(payload).unwrap();
    }
    file.close();
}

fn open_reader(path: &std::path::Path) -> FramedFile {
    let mut file = FramedFile::new(path, true);
    file.open_read().unwrap();
    file
}

// =============================================================================
// Length guard
// =============================================================================

/// A prefix at the guard is loss from the prefix to EOF.
#[test]
fn test_guard_value_reports_remaining_bytes() {
    let temp_dir = create_temp_dir();
    let path = temp_dir.path().join("guard.dat");
    write_records(&path, &[b"good-1", b"good-2"]);

    let offset = fs::metadata(&path).unwrap().len();
    {
        let mut bytes = fs::read(&path).unwrap();
        bytes.extend_from_slice(&encode_length(0x7FFF_FFFF));
        bytes.extend_from_slice(&[0u8; 20]);
        fs::write(&path, bytes).unwrap();
    }
    let file_size = fs::metadata(&path).unwrap().len();

    let mut reader = open_reader(&path);
    assert!(reader.read_next().is_record());
    assert!(reader.read_next().is_record());

    let loss = *reader.read_next().loss().expect("corruption expected");
    assert_eq!(loss.reason, LossReason::LengthOverflow);
    assert_eq!(loss.offset, Some(offset));
    assert_eq!(loss.bytes, file_size - offset);
}

/// Flipping the top bit of the first prefix makes the whole file unreadable.
#[test]
fn test_flipped_high_bit_loses_whole_file() {
    let temp_dir = create_temp_dir();
    let path = temp_dir.path().join("flip.dat");
    write_records(&path, &[b"abc", b"def"]);

    let mut bytes = fs::read(&path).unwrap();
    bytes[3] |= 0x80;
    fs::write(&path, &bytes).unwrap();

    let mut reader = open_reader(&path);
    let loss = *reader.read_next().loss().unwrap();
    assert_eq!(loss.bytes, bytes.len() as u64);
    assert_eq!(loss.offset, Some(0));
}

/// An oversized first prefix is charged against the whole file, even when
/// a valid frame follows it.
#[test]
fn test_oversized_first_prefix_charges_whole_file() {
    let temp_dir = create_temp_dir();
    let path = temp_dir.path().join("stuck.dat");
    let mut bytes = encode_length(u32::MAX).to_vec();
    bytes.extend_from_slice(&encode_length(2));
    bytes.extend_from_slice(b"ok");
    fs::write(&path, &bytes).unwrap();

    let mut reader = open_reader(&path);
    let first = reader.read_next();
    assert_eq!(first.loss().map(|l| l.reason), Some(LossReason::LengthOverflow));
    assert_eq!(first.loss().map(|l| l.bytes), Some(10));
}

/// A damaged prefix just under the guard is a short read, not an allocation.
#[test]
fn test_damaged_prefix_below_guard_does_not_grow_buffer() {
    let temp_dir = create_temp_dir();
    let path = temp_dir.path().join("bitflip.dat");
    write_records(&path, &[b"first", b"second"]);

    // Second prefix starts at offset 9; set a high bit in its top byte.
    let mut bytes = fs::read(&path).unwrap();
    bytes[12] = 0x40;
    fs::write(&path, &bytes).unwrap();

    let mut reader = open_reader(&path);
    assert_eq!(reader.read_next(), ReadOutcome::Record(b"first".to_vec()));

    let loss = *reader.read_next().loss().unwrap();
    assert_eq!(loss.reason, LossReason::ShortRead);
    assert_eq!(loss.offset, Some(9));
    assert_eq!(loss.bytes, 10);
    assert_eq!(reader.read_buffer().capacity(), 64 * 1024);
    assert_eq!(reader.metrics().snapshot().buffer_allocations, 1);
}

// =============================================================================
// Short reads
// =============================================================================

/// A crash mid-append leaves a prefix with too few payload bytes.
#[test]
fn test_torn_write_reports_tail() {
    let temp_dir = create_temp_dir();
    let path = temp_dir.path().join("torn.dat");
    write_records(&path, &[b"complete"]);

    let offset = fs::metadata(&path).unwrap().len();
    {
        let mut bytes = fs::read(&path).unwrap();
        bytes.extend_from_slice(&encode_length(1000));
        bytes.extend_from_slice(&[7u8; 100]);
        fs::write(&path, bytes).unwrap();
    }

    let mut reader = open_reader(&path);
    assert_eq!(reader.read_next(), ReadOutcome::Record(b"complete".to_vec()));

    match reader.read_next() {
        ReadOutcome::Corruption(loss) => {
            assert_eq!(loss.reason, LossReason::ShortRead);
            assert_eq!(loss.offset, Some(offset));
            assert_eq!(loss.bytes, 104);
            assert_ne!(loss.bytes, LOSS_SENTINEL);
        }
        other => panic!("expected corruption, got {:?}", other),
    }

    let snapshot = reader.metrics().snapshot();
    assert_eq!(snapshot.records_read, 1);
    assert_eq!(snapshot.corruption_events, 1);
    assert_eq!(snapshot.bytes_lost, 104);
}

/// A torn prefix (1-3 bytes) is treated as the end of the stream.
#[test]
fn test_torn_prefix_ends_stream() {
    let temp_dir = create_temp_dir();
    let path = temp_dir.path().join("torn-prefix.dat");
    write_records(&path, &[b"x"]);
    {
        let mut bytes = fs::read(&path).unwrap();
        bytes.extend_from_slice(&[3, 0, 0]);
        fs::write(&path, bytes).unwrap();
    }

    let mut reader = open_reader(&path);
    assert!(reader.read_next().is_record());
    assert_eq!(reader.read_next(), ReadOutcome::EndOfStream);
}

// =============================================================================
// Replay
// =============================================================================

#[test]
fn test_replay_reports_records_before_loss() {
    let temp_dir = create_temp_dir();
    let path = temp_dir.path().join("replay.dat");
    write_records(&path, &[b"r1", b"r2", b"r3"]);

    let full = fs::read(&path).unwrap();
    fs::write(&path, &full[..full.len() - 1]).unwrap();

    let mut reader = open_reader(&path);
    let mut delivered = Vec::new();
    let stats = RecordReplayer::replay(&mut reader, &mut |p: &[u8]| delivered.push(p.to_vec()));

    assert_eq!(delivered, vec![b"r1".to_vec(), b"r2".to_vec()]);
    assert_eq!(stats.records_replayed, 2);
    assert_eq!(stats.loss.map(|l| l.bytes), Some(5));
    assert!(!stats.is_clean());
}

// =============================================================================
// Reader trailing a writer
// =============================================================================

/// Unflushed output is invisible; after flush the reader sees the frame.
#[test]
fn test_trailing_reader_sees_only_flushed_frames() {
    let temp_dir = create_temp_dir();
    let path = temp_dir.path().join("live.dat");

    let mut writer = FramedFile::new(&path, true);
    writer.open_append().unwrap();
    writer.append_record(b"flushed").unwrap();
    writer.flush().unwrap();
    writer.append_record(b"pending").unwrap();

    let mut reader = open_reader(&path);
    assert_eq!(reader.read_next(), ReadOutcome::Record(b"flushed".to_vec()));
    assert_eq!(reader.read_next(), ReadOutcome::EndOfStream);

    writer.close();
}

// =============================================================================
// Configuration
// =============================================================================

/// A lowered guard turns ordinary records into corruption.
#[test]
fn test_configured_guard_applies() {
    let temp_dir = create_temp_dir();
    let path = temp_dir.path().join("cfg.dat");
    write_records(&path, &[b"short", b"much longer record"]);

    let config = StoreConfig::from_json(r#"{"max_record_length": 10}"#).unwrap();
    let mut reader = FramedFile::with_config(&path, true, config);
    reader.open_read().unwrap();

    assert_eq!(reader.read_next(), ReadOutcome::Record(b"short".to_vec()));
    let loss = *reader.read_next().loss().unwrap();
    assert_eq!(loss.reason, LossReason::LengthOverflow);
    assert_eq!(loss.bytes, 22);
}
