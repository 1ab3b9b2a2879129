use clap::Parser;
use drive_labeler_rust::{cli, config, drive, error, label, store};
use cli::{Cli, Commands};
use config::Config;
use error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Label { folder, batched, batch_size, max_image_size } => {
            println!("📂 drive-labeler - ラベリング\n");

            let mut config = Config::from_env()?;
            if let Some(folder) = folder {
                config.folder_id = folder;
            }
            if let Some(batch_size) = batch_size {
                config.batch_size = batch_size;
            }
            if let Some(max_image_size) = max_image_size {
                config.max_image_size = max_image_size;
            }

            label::run_interactive_label(&config, batched, cli.verbose).await?;
        }

        Commands::Status { folder } => {
            println!("📊 drive-labeler - 進捗\n");

            let mut config = Config::from_env()?;
            if let Some(folder) = folder {
                config.folder_id = folder;
            }

            let drive = drive::DriveClient::new(&config.drive_token, config.batch_size)?;
            let store = store::LabelStore::new(&config.supabase_url, &config.supabase_key)?;

            println!("[1/2] 画像一覧を取得中...");
            let images = drive.list_all(&config.folder_id).await?;
            println!("✔ {}枚\n", images.len());

            println!("[2/2] ラベルを取得中...");
            let labels = store.load_all().await?;
            println!("✔ {}件\n", labels.len());

            let labeled = labels.values().filter(|r| r.is_labeled()).count();
            let skipped = labels.len() - labeled;

            println!("ラベル済み: {}", labeled);
            println!("スキップ: {}", skipped);
            if !images.is_empty() {
                println!(
                    "進捗: {:.1}% ({}/{})",
                    labeled as f64 / images.len() as f64 * 100.0,
                    labeled,
                    images.len()
                );
            }

            println!("\n面ごとの件数:");
            for side in store::Side::ALL {
                let count = labels
                    .values()
                    .filter(|r| r.is_labeled() && r.side == side)
                    .count();
                println!("  {:>5}: {}", side.as_str(), count);
            }
        }

        Commands::Config { show } => {
            if show {
                let config = Config::from_env()?;
                println!("{}", config.masked_summary());
            } else {
                println!("--show で設定を表示します");
            }
        }
    }

    Ok(())
}
