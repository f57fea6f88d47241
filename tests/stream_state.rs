use std::path::{Path, PathBuf};

use visframe::{BinStream, Frame, StreamHeaders, StreamMode, VisframeError};

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "visframe_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

/// Write a 2x2 stream whose frame `i` is filled with the value `i`.
fn write_counting_stream(path: &Path, nframes: u32) {
    let mut headers = StreamHeaders::new(StreamMode::Write);
    headers.height = 2;
    headers.width = 2;
    headers.nframes = nframes;
    let mut writer = BinStream::new(path, headers);
    writer.open().unwrap();
    for i in 0..nframes {
        let mut frame = Frame::new(2, 2).unwrap();
        frame.as_mut_slice().fill(f64::from(i));
        writer.write(&frame).unwrap();
    }
    writer.close().unwrap();
}

fn open_reader(path: &Path) -> BinStream {
    let mut reader = BinStream::new(path, StreamHeaders::new(StreamMode::Read));
    reader.open().unwrap();
    reader
}

#[test]
fn first_and_last_select_the_expected_frames() {
    let tmp = temp_dir("state_first_last");
    std::fs::create_dir_all(&tmp).unwrap();
    let path = tmp.join("counting.stream");
    write_counting_stream(&path, 4);

    let mut reader = open_reader(&path);

    reader.first().unwrap();
    reader.last().unwrap();
    assert_eq!(reader.headers().current_frame(), 3);
    let final_frame = reader.read().unwrap();
    assert_eq!(final_frame.get(0, 0), Some(3.0));

    reader.first().unwrap();
    assert_eq!(reader.headers().current_frame(), 0);
    let first_frame = reader.read().unwrap();
    assert_eq!(first_frame.get(0, 0), Some(0.0));

    assert_ne!(first_frame, final_frame);
    reader.close().unwrap();

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn rejected_move_leaves_the_session_untouched() {
    let tmp = temp_dir("state_move_bounds");
    std::fs::create_dir_all(&tmp).unwrap();
    let path = tmp.join("counting.stream");
    write_counting_stream(&path, 3);

    let mut reader = open_reader(&path);
    reader.read().unwrap();

    assert!(matches!(
        reader.move_by(10),
        Err(VisframeError::EndOfStream(_))
    ));
    assert!(matches!(
        reader.move_by(-2),
        Err(VisframeError::EndOfStream(_))
    ));
    assert!(reader.headers().is_opened());
    assert_eq!(reader.headers().current_frame(), 1);

    // The next read behaves as if the failed moves never happened.
    let frame = reader.read().unwrap();
    assert_eq!(frame.get(0, 0), Some(1.0));

    // A valid move still works afterwards.
    reader.move_by(-2).unwrap();
    let frame = reader.read().unwrap();
    assert_eq!(frame.get(0, 0), Some(0.0));
    reader.close().unwrap();

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn opening_for_write_never_clobbers_an_existing_file() {
    let tmp = temp_dir("state_no_overwrite");
    std::fs::create_dir_all(&tmp).unwrap();
    let path = tmp.join("precious.stream");
    std::fs::write(&path, b"do not touch").unwrap();

    let mut writer = BinStream::new(&path, StreamHeaders::new(StreamMode::Write));
    assert!(matches!(writer.open(), Err(VisframeError::FileExists(_))));
    assert!(!writer.headers().is_opened());
    assert_eq!(std::fs::read(&path).unwrap(), b"do not touch");

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn shape_mismatch_is_rejected_without_advancing() {
    let tmp = temp_dir("state_shape");
    std::fs::create_dir_all(&tmp).unwrap();
    let path = tmp.join("shaped.stream");

    let mut headers = StreamHeaders::new(StreamMode::Write);
    headers.height = 2;
    headers.width = 2;
    headers.nframes = 2;
    let mut writer = BinStream::new(&path, headers);
    writer.open().unwrap();

    let good = Frame::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
    writer.write(&good).unwrap();

    let wrong = Frame::new(3, 2).unwrap();
    assert!(matches!(
        writer.write(&wrong),
        Err(VisframeError::ShapeMismatch(_))
    ));
    assert!(writer.headers().is_opened());
    assert_eq!(writer.headers().current_frame(), 1);
    writer.close().unwrap();

    // Only the good frame made it to disk, and it is intact.
    let mut reader = open_reader(&path);
    assert_eq!(reader.headers().nframes, 1);
    assert_eq!(reader.read().unwrap(), good);
    reader.close().unwrap();

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn foreign_files_are_rejected_on_open() {
    let tmp = temp_dir("state_bad_magic");
    std::fs::create_dir_all(&tmp).unwrap();
    let path = tmp.join("foreign.bin");
    std::fs::write(&path, vec![0x42u8; 400]).unwrap();

    let mut reader = BinStream::new(&path, StreamHeaders::new(StreamMode::Read));
    assert!(matches!(reader.open(), Err(VisframeError::BadMagic(_))));
    assert!(!reader.headers().is_opened());

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn oversized_shapes_in_the_header_are_rejected_on_open() {
    let tmp = temp_dir("state_oversized_shape");
    std::fs::create_dir_all(&tmp).unwrap();
    let path = tmp.join("huge.stream");

    // Valid magic, positive dimensions, but a frame no allocation could hold.
    let mut bytes = vec![0u8; 256];
    bytes[..23].copy_from_slice(b"#!vis-brain.data.stream");
    bytes.extend_from_slice(&i32::MAX.to_ne_bytes());
    bytes.extend_from_slice(&i32::MAX.to_ne_bytes());
    bytes.extend_from_slice(&1i32.to_ne_bytes());
    bytes.extend_from_slice(&12000.0f64.to_ne_bytes());
    bytes.extend_from_slice(&12000.0f64.to_ne_bytes());
    bytes.extend_from_slice(&1.0f64.to_ne_bytes());
    std::fs::write(&path, &bytes).unwrap();

    let mut reader = BinStream::new(&path, StreamHeaders::new(StreamMode::Read));
    assert!(matches!(reader.open(), Err(VisframeError::Validation(_))));
    assert!(!reader.headers().is_opened());

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn header_fields_beyond_the_i32_limit_never_create_a_file() {
    let tmp = temp_dir("state_i32_limit");
    std::fs::create_dir_all(&tmp).unwrap();
    let path = tmp.join("huge_count.stream");

    let mut headers = StreamHeaders::new(StreamMode::Write);
    headers.height = 2;
    headers.width = 2;
    headers.nframes = 3_000_000_000;
    let mut writer = BinStream::new(&path, headers);
    assert!(matches!(writer.open(), Err(VisframeError::Validation(_))));
    assert!(!writer.headers().is_opened());
    // The header was rejected before the file was created.
    assert!(!path.exists());

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn truncated_files_fail_to_open() {
    let tmp = temp_dir("state_truncated");
    std::fs::create_dir_all(&tmp).unwrap();
    let path = tmp.join("truncated.stream");
    std::fs::write(&path, b"#!vis-brain.data.stream").unwrap();

    let mut reader = BinStream::new(&path, StreamHeaders::new(StreamMode::Read));
    assert!(reader.open().is_err());
    assert!(!reader.headers().is_opened());

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn mode_and_state_guards_fire_before_any_io() {
    let tmp = temp_dir("state_guards");
    std::fs::create_dir_all(&tmp).unwrap();
    let path = tmp.join("guarded.stream");
    write_counting_stream(&path, 2);

    // Reads on a write stream are rejected even before open.
    let mut writer = BinStream::new(tmp.join("new.stream"), StreamHeaders::new(StreamMode::Write));
    assert!(matches!(writer.read(), Err(VisframeError::WrongMode(_))));
    writer.open().unwrap();
    assert!(matches!(writer.read(), Err(VisframeError::WrongMode(_))));
    assert!(matches!(writer.move_by(0), Err(VisframeError::WrongMode(_))));
    writer.close().unwrap();

    // Writes on a read stream are rejected.
    let mut reader = open_reader(&path);
    let frame = Frame::new(2, 2).unwrap();
    assert!(matches!(
        reader.write(&frame),
        Err(VisframeError::WrongMode(_))
    ));
    reader.close().unwrap();

    // Everything is rejected once closed.
    assert!(matches!(reader.read(), Err(VisframeError::WrongMode(_))));
    assert!(matches!(reader.first(), Err(VisframeError::WrongMode(_))));
    assert!(matches!(reader.last(), Err(VisframeError::WrongMode(_))));

    std::fs::remove_dir_all(&tmp).ok();
}
