//! Google Driveインベントリ取得アダプタ
//!
//! フォルダ直下のファイル一覧をDrive v3 APIで取得する。ページネーション
//! は不透明トークンで、`list_all`はトークンが尽きるまで透過的に辿る。
//! 途中ページの取得失敗は明示的なエラーとして返し、そこまでの結果を
//! 完全な一覧として扱うことはしない。

use crate::error::{LabelerError, Result};
use serde::Deserialize;
use std::time::Duration;

const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Drive上の画像ファイル記述子
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DriveImage {
    pub id: String,
    pub name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

#[derive(Debug, Deserialize)]
struct FileListResponse {
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
    #[serde(default)]
    files: Vec<DriveImage>,
}

/// 画像MIMEタイプのみに絞り込み、ファイル名昇順に整列
fn filter_and_sort(files: Vec<DriveImage>) -> Vec<DriveImage> {
    let mut images: Vec<DriveImage> = files
        .into_iter()
        .filter(|f| f.mime_type.starts_with("image/"))
        .collect();
    images.sort_by(|a, b| a.name.cmp(&b.name));
    images
}

pub struct DriveClient {
    http: reqwest::Client,
    token: String,
    page_size: usize,
}

impl DriveClient {
    pub fn new(token: &str, page_size: usize) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| LabelerError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            token: token.to_string(),
            page_size,
        })
    }

    /// 1ページ分の一覧を取得（バッチモード用）
    pub async fn list_page(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> Result<(Vec<DriveImage>, Option<String>)> {
        let query = format!("'{}' in parents and trashed=false", folder_id);
        let page_size = self.page_size.to_string();

        let mut request = self
            .http
            .get(format!("{}/files", DRIVE_API_BASE))
            .bearer_auth(&self.token)
            .query(&[
                ("q", query.as_str()),
                ("fields", "nextPageToken, files(id,name,mimeType)"),
                ("pageSize", page_size.as_str()),
            ]);

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LabelerError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LabelerError::Transport(format!(
                "Drive一覧取得失敗 ({}): {}",
                status, text
            )));
        }

        let body: FileListResponse = response
            .json()
            .await
            .map_err(|e| LabelerError::Transport(e.to_string()))?;

        Ok((filter_and_sort(body.files), body.next_page_token))
    }

    /// 全ページを辿って一覧を取得
    pub async fn list_all(&self, folder_id: &str) -> Result<Vec<DriveImage>> {
        let mut images = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let (page, next) = self.list_page(folder_id, page_token.as_deref()).await?;
            images.extend(page);

            match next {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        // ページをまたいだ全体で名前順を保証
        images.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(images)
    }

    /// ファイル本体のバイト列を取得
    pub async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(format!("{}/files/{}", DRIVE_API_BASE, file_id))
            .query(&[("alt", "media")])
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| LabelerError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LabelerError::Transport(format!(
                "Driveダウンロード失敗 ({}): {}",
                status, text
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| LabelerError::Transport(e.to_string()))?;

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, mime: &str) -> DriveImage {
        DriveImage {
            id: format!("id-{}", name),
            name: name.to_string(),
            mime_type: mime.to_string(),
        }
    }

    #[test]
    fn test_filter_keeps_only_images() {
        let files = vec![
            file("a.jpg", "image/jpeg"),
            file("notes.txt", "text/plain"),
            file("b.png", "image/png"),
            file("sheet.csv", "application/vnd.google-apps.spreadsheet"),
        ];
        let images = filter_and_sort(files);
        assert_eq!(images.len(), 2);
        assert!(images.iter().all(|f| f.mime_type.starts_with("image/")));
    }

    #[test]
    fn test_filter_sorts_by_name() {
        let files = vec![
            file("c.jpg", "image/jpeg"),
            file("a.jpg", "image/jpeg"),
            file("b.jpg", "image/jpeg"),
        ];
        let images = filter_and_sort(files);
        let names: Vec<&str> = images.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[test]
    fn test_list_response_parsing() {
        let json = r#"{
            "nextPageToken": "tok123",
            "files": [
                {"id": "1", "name": "a.jpg", "mimeType": "image/jpeg"},
                {"id": "2", "name": "b.txt", "mimeType": "text/plain"}
            ]
        }"#;
        let body: FileListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.next_page_token.as_deref(), Some("tok123"));
        assert_eq!(body.files.len(), 2);
    }

    #[test]
    fn test_list_response_last_page_has_no_token() {
        let json = r#"{"files": []}"#;
        let body: FileListResponse = serde_json::from_str(json).unwrap();
        assert!(body.next_page_token.is_none());
        assert!(body.files.is_empty());
    }
}
