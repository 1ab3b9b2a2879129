use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "drive-labeler")]
#[command(about = "Google Drive画像ラベリングツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 対話的に画像へラベルを付与
    Label {
        /// 対象フォルダID（省略時は環境変数のフォルダ）
        #[arg(long)]
        folder: Option<String>,

        /// バッチモード（全件ではなく1ページずつ取得）
        #[arg(short, long)]
        batched: bool,

        /// 1ページの取得枚数（50〜1000）
        #[arg(long)]
        batch_size: Option<usize>,

        /// 表示画像の最大辺（px）
        #[arg(long)]
        max_image_size: Option<u32>,
    },

    /// ラベル進捗の集計を表示
    Status {
        /// 対象フォルダID（省略時は環境変数のフォルダ）
        #[arg(long)]
        folder: Option<String>,
    },

    /// 設定を表示
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
