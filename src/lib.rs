//! Google Drive画像ラベリングツール
//!
//! Driveフォルダ内の画像を1枚ずつ取得し、説明と車両面（front/back/
//! left/right/none）をSupabaseの`image_labels`テーブルへ保存する。
//! セッションの状態遷移は`session`モジュールがI/Oなしで定義する。

pub mod cli;
pub mod config;
pub mod drive;
pub mod error;
pub mod label;
pub mod materialize;
pub mod session;
pub mod store;
