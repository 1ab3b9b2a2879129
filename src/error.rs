use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelerError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("通信エラー: {0}")]
    Transport(String),

    #[error("入力エラー: {0}")]
    Validation(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("CLI実行エラー: {0}")]
    CliExecution(String),
}

pub type Result<T> = std::result::Result<T, LabelerError>;
