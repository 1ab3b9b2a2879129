//! Supabaseラベル保存アダプタ
//!
//! `image_labels`テーブル（image_name / description / side）への
//! 全件読み込みと1件upsertのみを提供する。upsertは`image_name`を
//! キーとした挿入または置換で、同一レコードを2回適用しても結果は
//! 変わらない。

use crate::error::{LabelerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// スキップを表す予約済み説明値
pub const SKIP_SENTINEL: &str = "None";

const LABELS_TABLE: &str = "image_labels";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// 車両の面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Front,
    Back,
    Left,
    Right,
    #[default]
    None,
}

impl Side {
    pub const ALL: [Side; 5] = [Side::Front, Side::Back, Side::Left, Side::Right, Side::None];

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Front => "front",
            Side::Back => "back",
            Side::Left => "left",
            Side::Right => "right",
            Side::None => "none",
        }
    }

    /// 不明な値は`none`に落とす（旧データに任意文字列が混在するため）
    pub fn parse_lossy(s: &str) -> Side {
        match s.trim().to_lowercase().as_str() {
            "front" => Side::Front,
            "back" => Side::Back,
            "left" => Side::Left,
            "right" => Side::Right,
            _ => Side::None,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 1画像分のラベルレコード
///
/// 旧データには`description`がNULLの行や`side`列を持たない行が
/// 残っているため、読み込み時に`RawRow`経由で正規化する。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRow")]
pub struct LabelRecord {
    pub image_name: String,
    pub description: String,
    pub side: Side,
}

impl LabelRecord {
    pub fn new(image_name: impl Into<String>, description: impl Into<String>, side: Side) -> Self {
        Self {
            image_name: image_name.into(),
            description: description.into(),
            side,
        }
    }

    /// スキップ印のレコードを作る
    pub fn skip(image_name: impl Into<String>) -> Self {
        Self::new(image_name, SKIP_SENTINEL, Side::None)
    }

    /// 実質的にラベル済みか（空・センチネルはラベル無しとみなす）
    pub fn is_labeled(&self) -> bool {
        let desc = self.description.trim();
        !desc.is_empty() && desc != SKIP_SENTINEL
    }
}

/// ストアの生データ行（正規化前）
#[derive(Deserialize)]
struct RawRow {
    image_name: String,
    description: Option<String>,
    side: Option<String>,
}

impl From<RawRow> for LabelRecord {
    fn from(row: RawRow) -> Self {
        Self {
            image_name: row.image_name,
            description: row.description.unwrap_or_default(),
            side: row.side.as_deref().map(Side::parse_lossy).unwrap_or_default(),
        }
    }
}

/// Supabase PostgRESTクライアント
pub struct LabelStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl LabelStore {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| LabelerError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, LABELS_TABLE)
    }

    /// 全ラベルのスナップショットを取得
    ///
    /// 同名キーが複数あった場合は後勝ち。
    pub async fn load_all(&self) -> Result<HashMap<String, LabelRecord>> {
        let response = self
            .http
            .get(self.table_url())
            .query(&[("select", "*")])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| LabelerError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LabelerError::Transport(format!(
                "ラベル読み込み失敗 ({}): {}",
                status, text
            )));
        }

        let records: Vec<LabelRecord> = response
            .json()
            .await
            .map_err(|e| LabelerError::Transport(e.to_string()))?;

        Ok(records
            .into_iter()
            .map(|r| (r.image_name.clone(), r))
            .collect())
    }

    /// 1件のラベルを挿入または置換
    pub async fn upsert(&self, record: &LabelRecord) -> Result<()> {
        let response = self
            .http
            .post(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(record)
            .send()
            .await
            .map_err(|e| LabelerError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LabelerError::Transport(format!(
                "ラベル保存失敗 ({}): {}",
                status, text
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_parse_lossy() {
        assert_eq!(Side::parse_lossy("front"), Side::Front);
        assert_eq!(Side::parse_lossy(" Back "), Side::Back);
        assert_eq!(Side::parse_lossy("LEFT"), Side::Left);
        assert_eq!(Side::parse_lossy("rear"), Side::None);
        assert_eq!(Side::parse_lossy(""), Side::None);
    }

    #[test]
    fn test_is_labeled() {
        assert!(LabelRecord::new("a.jpg", "へこみあり", Side::Front).is_labeled());
        assert!(!LabelRecord::new("a.jpg", "", Side::Front).is_labeled());
        assert!(!LabelRecord::new("a.jpg", "   ", Side::Front).is_labeled());
        assert!(!LabelRecord::skip("a.jpg").is_labeled());
    }

    #[test]
    fn test_upsert_body_serializes_side_lowercase() {
        let record = LabelRecord::new("a.jpg", "dent", Side::Front);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["image_name"], "a.jpg");
        assert_eq!(json["description"], "dent");
        assert_eq!(json["side"], "front");
    }
}
