//! 画像マテリアライズモジュール
//!
//! Driveから取得したバイト列をデコードし、長辺を上限以下に縮小して
//! JPEG再圧縮した一時ファイルとして書き出す。デコードバッファは
//! 呼び出しごとに解放され、プロセス内に蓄積しない。保持するのは
//! 現在カーソルの1枚だけで、離れて戻った場合は再取得する。

use crate::drive::{DriveClient, DriveImage};
use crate::error::{LabelerError, Result};
use image::codecs::jpeg::JpegEncoder;
use std::path::{Path, PathBuf};

/// 再圧縮時のJPEG品質
const JPEG_QUALITY: u8 = 80;

/// 長辺が`max_dim`以下になるよう縮小し、JPEGへ再エンコードする
///
/// 既に上限以下の画像は縮小せず再エンコードのみ行う（拡大はしない）。
pub fn shrink_to_bound(bytes: &[u8], max_dim: u32) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| LabelerError::ImageLoad(e.to_string()))?;

    let bounded = if decoded.width() > max_dim || decoded.height() > max_dim {
        decoded.thumbnail(max_dim, max_dim)
    } else {
        decoded
    };

    // JPEGはアルファ非対応のためRGBへ落とす
    let rgb = bounded.to_rgb8();
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    encoder
        .encode(&rgb, rgb.width(), rgb.height(), image::ExtendedColorType::Rgb8)
        .map_err(|e| LabelerError::ImageLoad(e.to_string()))?;

    Ok(out)
}

/// ファイル名から区切り文字を除去（一時フォルダ外への書き出し防止）
fn safe_file_name(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

/// 記述子を表示可能な一時ファイルへ解決する
pub async fn materialize(
    client: &DriveClient,
    descriptor: &DriveImage,
    temp_dir: &Path,
    max_dim: u32,
) -> Result<PathBuf> {
    let bytes = client.download(&descriptor.id).await?;
    let shrunk = shrink_to_bound(&bytes, max_dim)?;

    std::fs::create_dir_all(temp_dir)?;
    let path = temp_dir.join(safe_file_name(&descriptor.name));
    std::fs::write(&path, shrunk)?;

    Ok(path)
}

/// 一時フォルダを空にする（バッチ境界で呼ぶ）
pub fn clear_temp(temp_dir: &Path) -> Result<()> {
    if temp_dir.exists() {
        std::fs::remove_dir_all(temp_dir)?;
    }
    std::fs::create_dir_all(temp_dir)?;
    Ok(())
}
