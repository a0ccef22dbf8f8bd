//! End-to-end export flow tests.

mod common;

use colorcard::error::ExportError;
use colorcard::models::SizeProfile;
use colorcard::rendering::PIXEL_RATIO;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_full_export_writes_supersampled_card() {
    let dir = tempfile::tempdir().unwrap();
    let state = common::session_with_image(common::solid_png(120, 90, [200, 10, 10]), "Ada");
    let exporter = common::test_exporter(dir.path());

    let outcome = exporter
        .export(&state, &SizeProfile::NORMAL)
        .await
        .unwrap();

    assert!(!outcome.timed_out);
    assert_eq!(
        outcome.path.file_name().unwrap().to_str().unwrap(),
        "pantone-card-Ada.png"
    );

    let written = std::fs::read(&outcome.path).unwrap();
    assert_eq!(written.len(), outcome.bytes_written);

    let card = image::load_from_memory(&written).unwrap();
    assert_eq!(card.width(), SizeProfile::NORMAL.width * PIXEL_RATIO);
    assert_eq!(card.height(), SizeProfile::NORMAL.height * PIXEL_RATIO);

    // Photo covers the image section; text section stays white
    let rgba = card.to_rgba8();
    let photo_pixel = rgba.get_pixel(card.width() / 2, 100);
    assert_eq!(photo_pixel.0[..3], [200, 10, 10]);
    let text_pixel = rgba.get_pixel(4, card.height() - 4);
    assert_eq!(text_pixel.0[..3], [255, 255, 255]);
}

#[tokio::test]
async fn test_story_profile_suffix_and_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    let state = common::session_with_image(common::solid_png(64, 64, [10, 120, 30]), "");
    let exporter = common::test_exporter(dir.path());

    let outcome = exporter
        .export(&state, &SizeProfile::INSTAGRAM_STORY)
        .await
        .unwrap();

    assert_eq!(
        outcome.path.file_name().unwrap().to_str().unwrap(),
        "pantone-card-color-story.png"
    );

    let card = image::load_from_memory(&std::fs::read(&outcome.path).unwrap()).unwrap();
    assert_eq!(card.width(), 2160);
    assert_eq!(card.height(), 3840);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_second_export_is_rejected_while_first_runs() {
    let dir = tempfile::tempdir().unwrap();
    let state = common::session_with_image(common::solid_png(80, 80, [5, 5, 5]), "Grace");
    let exporter = Arc::new(common::slow_exporter(dir.path()));

    let first = tokio::spawn({
        let exporter = exporter.clone();
        let state = state.clone();
        async move { exporter.export(&state, &SizeProfile::NORMAL).await }
    });

    // The slow gate keeps the first export in flight well past this point
    tokio::time::sleep(Duration::from_millis(100)).await;
    let second = exporter.export(&state, &SizeProfile::INSTAGRAM_POST).await;
    match second {
        Err(ExportError::ExportInProgress) => {}
        other => panic!("Expected ExportInProgress, got {other:?}"),
    }

    // The first job is unharmed and its output intact
    let outcome = first.await.unwrap().unwrap();
    let card = image::load_from_memory(&std::fs::read(&outcome.path).unwrap()).unwrap();
    assert_eq!(card.width(), 800);
    assert_eq!(card.height(), 1066);

    // The flag was released, so a fresh export goes through
    assert!(!state.lock().unwrap().export_in_flight());
    exporter
        .export(&state, &SizeProfile::NORMAL)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_undecodable_image_fails_and_releases_flag() {
    let dir = tempfile::tempdir().unwrap();
    let state = common::session_with_image(b"not an image at all".to_vec(), "Ada");
    let exporter = common::test_exporter(dir.path());

    let result = exporter.export(&state, &SizeProfile::NORMAL).await;
    match result {
        Err(ExportError::ImageLoadFailed) => {}
        other => panic!("Expected ImageLoadFailed, got {other:?}"),
    }

    assert!(!state.lock().unwrap().export_in_flight());
}

#[tokio::test]
async fn test_export_without_image_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let state = std::sync::Arc::new(std::sync::Mutex::new(
        colorcard::models::CardState::new(),
    ));
    let exporter = common::test_exporter(dir.path());

    let result = exporter.export(&state, &SizeProfile::NORMAL).await;
    match result {
        Err(ExportError::InvalidImage(_)) => {}
        other => panic!("Expected InvalidImage, got {other:?}"),
    }
}

#[tokio::test]
async fn test_repeated_exports_are_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let state = common::session_with_image(common::solid_png(100, 75, [33, 144, 250]), "Ada");
    let exporter = common::test_exporter(dir.path());

    let first = exporter
        .export(&state, &SizeProfile::NORMAL)
        .await
        .unwrap();
    let first_bytes = std::fs::read(&first.path).unwrap();

    let second = exporter
        .export(&state, &SizeProfile::NORMAL)
        .await
        .unwrap();
    let second_bytes = std::fs::read(&second.path).unwrap();

    assert_eq!(first_bytes, second_bytes);
}
