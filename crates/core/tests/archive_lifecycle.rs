//! Archive lifecycle integration tests.
//!
//! These tests drive `convert_into_archive` the way the batch endpoint does:
//! - Archive bytes arrive while the batch is still running
//! - Failed items are skipped, order is kept
//! - A vanished consumer aborts the batch instead of hanging it

use std::io::{Cursor, Read};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use pixconv_core::{
    archive::ArchiveChunk,
    convert_into_archive,
    testing::{fixtures, MockConverter},
    ArchiveConfig, ArchiveError, BatchItem, Converter, RasterConverter, TargetFormat, ZipStream,
};

async fn collect(mut rx: mpsc::Receiver<ArchiveChunk>) -> Vec<u8> {
    let mut out = Vec::new();
    while let Some(chunk) = rx.recv().await {
        out.extend_from_slice(&chunk.expect("archive stream failed"));
    }
    out
}

fn entry_names(bytes: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("not a ZIP");
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

fn small_chunks() -> ArchiveConfig {
    ArchiveConfig {
        chunk_size_bytes: 256,
        channel_capacity: 2,
        ..ArchiveConfig::default()
    }
}

#[tokio::test]
async fn test_real_images_stream_into_archive() {
    let converter = RasterConverter::with_defaults();
    let items = vec![
        BatchItem::new("one.jpg", fixtures::jpeg_bytes(64, 48)),
        BatchItem::new("two.jpg", fixtures::corrupt_bytes()),
        BatchItem::new("nested/dir/three.jpg", fixtures::jpeg_bytes(16, 16)),
    ];

    let (archive, rx) = ZipStream::channel(&small_chunks());
    let reader = tokio::spawn(collect(rx));

    let summary = convert_into_archive(&converter, items, TargetFormat::Png, archive)
        .await
        .unwrap();
    let bytes = reader.await.unwrap();

    assert_eq!(summary.entries, vec!["one.png", "three.png"]);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].file_name, "two.jpg");

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
    let mut first = Vec::new();
    archive.by_name("one.png").unwrap().read_to_end(&mut first).unwrap();
    let image = image::load_from_memory(&first).unwrap();
    assert_eq!((image.width(), image.height()), (64, 48));
}

#[tokio::test]
async fn test_first_bytes_arrive_before_batch_ends() {
    let converter = Arc::new(MockConverter::new());
    converter.set_conversion_duration(50).await;
    // JPEG data barely compresses, so every entry overflows a chunk
    let photo = fixtures::jpeg_bytes(64, 64);
    let items: Vec<BatchItem> = (0..4)
        .map(|i| BatchItem::new(format!("{}.jpg", i), photo.clone()))
        .collect();

    let (archive, mut rx) = ZipStream::channel(&small_chunks());
    let batch = {
        let converter = Arc::clone(&converter);
        tokio::spawn(async move {
            convert_into_archive(converter.as_ref(), items, TargetFormat::Gif, archive).await
        })
    };

    let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no archive bytes in time")
        .expect("stream ended early")
        .unwrap();
    assert_eq!(&first[0..4], b"PK\x03\x04");
    assert!(!batch.is_finished());

    let mut bytes = first.to_vec();
    bytes.extend(collect(rx).await);
    batch.await.unwrap().unwrap();

    assert_eq!(entry_names(&bytes), vec!["0.gif", "1.gif", "2.gif", "3.gif"]);
}

#[tokio::test]
async fn test_dropped_consumer_aborts_batch() {
    let converter = MockConverter::new();
    let photo = fixtures::jpeg_bytes(128, 128);
    let items: Vec<BatchItem> = (0..8)
        .map(|i| BatchItem::new(format!("{}.jpg", i), photo.clone()))
        .collect();

    let (archive, rx) = ZipStream::channel(&small_chunks());
    drop(rx);

    let result = convert_into_archive(&converter, items, TargetFormat::Tiff, archive).await;

    assert!(result.is_err(), "expected abort, got {:?}", result.ok());
    assert!(matches!(
        result.unwrap_err(),
        ArchiveError::Io(_) | ArchiveError::Closed | ArchiveError::Zip(_)
    ));
    // Nothing is converted after the consumer is gone
    assert!(converter.conversion_count().await < 8);
}

#[tokio::test]
async fn test_converter_trait_object_drives_batch() {
    let converter: Arc<dyn Converter> = Arc::new(RasterConverter::with_defaults());
    let items = vec![BatchItem::new("pic.jpg", fixtures::jpeg_bytes(8, 8))];

    let (archive, rx) = ZipStream::channel(&ArchiveConfig::default());
    let reader = tokio::spawn(collect(rx));
    convert_into_archive(converter.as_ref(), items, TargetFormat::Tiff, archive)
        .await
        .unwrap();

    assert_eq!(entry_names(&reader.await.unwrap()), vec!["pic.tiff"]);
}
