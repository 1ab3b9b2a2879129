//! 環境変数ベースの設定モジュール
//!
//! 必須項目が欠けている場合は起動時に`Config`エラーで停止する。
//! 部分的な縮退モードは持たない。

use crate::error::{LabelerError, Result};
use std::path::PathBuf;

/// 対象フォルダIDのデフォルト（原運用のフォルダ）
const DEFAULT_FOLDER_ID: &str = "1xW44N0s4moCUFfD2Q4Vz6tr7gYp9M6BE";

/// 1ページあたりの取得枚数（Drive APIの許容範囲）
const MIN_BATCH_SIZE: usize = 50;
const MAX_BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_key: String,
    pub drive_token: String,
    pub folder_id: String,
    pub batch_size: usize,
    pub max_image_size: u32,
    pub temp_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let supabase_url = require_env("SUPABASE_URL")?;
        let supabase_key = require_env("SUPABASE_KEY")?;
        let drive_token = require_env("GOOGLE_DRIVE_TOKEN")?;

        let folder_id = optional_env("GOOGLE_DRIVE_FOLDER_ID")
            .unwrap_or_else(|| DEFAULT_FOLDER_ID.to_string());

        let batch_size = match optional_env("LABELER_BATCH_SIZE") {
            Some(v) => parse_batch_size(&v)?,
            None => 200,
        };

        let max_image_size = match optional_env("LABELER_MAX_IMAGE_SIZE") {
            Some(v) => v.parse::<u32>().map_err(|_| {
                LabelerError::Config(format!("LABELER_MAX_IMAGE_SIZE が不正です: {}", v))
            })?,
            None => 1568,
        };

        let temp_dir = optional_env("LABELER_TEMP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./temp_drive"));

        Ok(Self {
            supabase_url,
            supabase_key,
            drive_token,
            folder_id,
            batch_size,
            max_image_size,
            temp_dir,
        })
    }

    /// 秘匿値をマスクした表示用文字列
    pub fn masked_summary(&self) -> String {
        format!(
            "設定:\n  Supabase URL: {}\n  Supabase キー: {}\n  Drive トークン: {}\n  フォルダID: {}\n  バッチサイズ: {}\n  最大画像サイズ: {}px\n  一時フォルダ: {}",
            self.supabase_url,
            mask(&self.supabase_key),
            mask(&self.drive_token),
            self.folder_id,
            self.batch_size,
            self.max_image_size,
            self.temp_dir.display(),
        )
    }
}

fn require_env(name: &str) -> Result<String> {
    optional_env(name)
        .ok_or_else(|| LabelerError::Config(format!("環境変数 {} が設定されていません", name)))
}

fn optional_env(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

fn parse_batch_size(value: &str) -> Result<usize> {
    let n: usize = value
        .parse()
        .map_err(|_| LabelerError::Config(format!("LABELER_BATCH_SIZE が不正です: {}", value)))?;

    if !(MIN_BATCH_SIZE..=MAX_BATCH_SIZE).contains(&n) {
        return Err(LabelerError::Config(format!(
            "LABELER_BATCH_SIZE は{}〜{}の範囲で指定してください: {}",
            MIN_BATCH_SIZE, MAX_BATCH_SIZE, n
        )));
    }

    Ok(n)
}

fn mask(secret: &str) -> &'static str {
    if secret.is_empty() {
        "未設定"
    } else {
        "設定済み"
    }
}
