//! 画像マテリアライズテスト
//!
//! 縮小・再エンコードの上限保証を検証

use drive_labeler_rust::error::LabelerError;
use drive_labeler_rust::materialize::{clear_temp, shrink_to_bound};
use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use tempfile::tempdir;

/// テスト用PNGバイト列を生成
fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("PNGエンコード失敗");
    bytes
}

/// 大きい画像は長辺がmax_dim以下に縮小される
#[test]
fn test_large_image_is_bounded() {
    let original = png_bytes(640, 480);
    let shrunk = shrink_to_bound(&original, 320).expect("縮小失敗");

    let decoded = image::load_from_memory(&shrunk).expect("再デコード失敗");
    assert!(decoded.width() <= 320);
    assert!(decoded.height() <= 320);
}

/// 縦横比は維持される
#[test]
fn test_aspect_ratio_preserved() {
    let original = png_bytes(800, 400);
    let shrunk = shrink_to_bound(&original, 200).expect("縮小失敗");

    let decoded = image::load_from_memory(&shrunk).expect("再デコード失敗");
    assert_eq!(decoded.width(), 200);
    assert_eq!(decoded.height(), 100);
}

/// 上限以下の画像は拡大されない
#[test]
fn test_small_image_is_not_upscaled() {
    let original = png_bytes(100, 80);
    let shrunk = shrink_to_bound(&original, 800).expect("再エンコード失敗");

    let decoded = image::load_from_memory(&shrunk).expect("再デコード失敗");
    assert_eq!(decoded.width(), 100);
    assert_eq!(decoded.height(), 80);
}

/// 出力はJPEGとしてデコードできる
#[test]
fn test_output_is_jpeg() {
    let original = png_bytes(64, 64);
    let shrunk = shrink_to_bound(&original, 800).expect("再エンコード失敗");

    let format = image::guess_format(&shrunk).expect("形式判定失敗");
    assert_eq!(format, ImageFormat::Jpeg);
}

/// 画像でないバイト列はImageLoadエラー
#[test]
fn test_garbage_bytes_error() {
    let result = shrink_to_bound(b"this is not an image", 800);
    assert!(matches!(result, Err(LabelerError::ImageLoad(_))));
}

/// clear_tempでフォルダが空になる（バッチ境界の副作用）
#[test]
fn test_clear_temp_empties_directory() {
    let dir = tempdir().expect("Failed to create temp dir");
    let temp = dir.path().join("materialized");
    std::fs::create_dir_all(&temp).unwrap();
    std::fs::write(temp.join("stale.jpg"), b"old bytes").unwrap();

    clear_temp(&temp).expect("クリア失敗");

    assert!(temp.exists());
    assert_eq!(std::fs::read_dir(&temp).unwrap().count(), 0);
}

/// clear_tempは存在しないフォルダも作成する
#[test]
fn test_clear_temp_creates_missing_directory() {
    let dir = tempdir().expect("Failed to create temp dir");
    let temp = dir.path().join("not-yet-created");

    clear_temp(&temp).expect("クリア失敗");

    assert!(temp.exists());
}
