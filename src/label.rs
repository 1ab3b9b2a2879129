//! 対話式ラベリングループ
//!
//! 操作はすべて1アクション=1回のコントローラ呼び出しに対応し、
//! 各アクション中の保存・取得は単一の同期的ステップとして完了を
//! 待つ。保存はストアへのupsert成功後にのみセッションへ反映する。

use crate::config::Config;
use crate::drive::DriveClient;
use crate::error::{LabelerError, Result};
use crate::materialize;
use crate::session::{
    validate_description, Direction, FilterMode, JumpOutcome, NavOutcome, SessionState,
};
use crate::store::{LabelRecord, LabelStore, Side};
use dialoguer::{Confirm, Input};
use indicatif::ProgressBar;
use std::time::Duration;

/// 操作入力の解釈結果
#[derive(Debug, Clone, PartialEq)]
pub enum LabelAction {
    /// 説明を保存して次へ
    Save(String),
    /// スキップ印を記録（確認つき）
    Skip,
    /// 前後へ移動
    Navigate(Direction),
    /// カーソル以降の未ラベルへ
    JumpNextUnlabeled,
    /// 先頭からの未ラベルへ
    JumpFirstUnlabeled,
    /// フィルタ切替
    ToggleFilter,
    /// 次の保存で使う面を選択
    SetSide(Side),
    /// 次のバッチを読み込む
    NextBatch,
    /// 終了
    Quit,
    /// 空入力
    Empty,
    /// 解釈できない1文字コマンド
    Unknown(String),
}

/// 入力文字列をアクションへ解釈する
pub fn parse_label_action(input: &str, batched: bool) -> LabelAction {
    let trimmed = input.trim();

    match trimmed {
        "" => LabelAction::Empty,
        "n" => LabelAction::Navigate(Direction::Next),
        "p" => LabelAction::Navigate(Direction::Prev),
        "u" => LabelAction::JumpNextUnlabeled,
        "U" => LabelAction::JumpFirstUnlabeled,
        "f" => LabelAction::ToggleFilter,
        "s" => LabelAction::Skip,
        "b" if batched => LabelAction::NextBatch,
        "b" => LabelAction::Unknown("b".to_string()),
        "q" | "Q" => LabelAction::Quit,
        "1" => LabelAction::SetSide(Side::Front),
        "2" => LabelAction::SetSide(Side::Back),
        "3" => LabelAction::SetSide(Side::Left),
        "4" => LabelAction::SetSide(Side::Right),
        "5" => LabelAction::SetSide(Side::None),
        _ => LabelAction::Save(trimmed.to_string()),
    }
}

fn filter_label(mode: FilterMode) -> &'static str {
    match mode {
        FilterMode::All => "全画像",
        FilterMode::UnlabeledOnly => "未ラベルのみ",
    }
}

fn toggled(mode: FilterMode) -> FilterMode {
    match mode {
        FilterMode::All => FilterMode::UnlabeledOnly,
        FilterMode::UnlabeledOnly => FilterMode::All,
    }
}

fn prompt(message: &str) -> Result<String> {
    Input::<String>::new()
        .with_prompt(message)
        .allow_empty(true)
        .interact_text()
        .map_err(|e| LabelerError::CliExecution(e.to_string()))
}

fn confirm_skip(name: &str) -> Result<bool> {
    Confirm::new()
        .with_prompt(format!("{} をスキップとして記録しますか？", name))
        .default(false)
        .interact()
        .map_err(|e| LabelerError::CliExecution(e.to_string()))
}

fn print_help(batched: bool) {
    println!("---");
    println!("操作: 説明を入力して保存 / [n]次 [p]前 [u]次の未ラベル [U]先頭の未ラベル");
    println!("      [f]フィルタ切替 [s]スキップ [1-5]面(front/back/left/right/none) [q]終了");
    if batched {
        println!("      [b]次のバッチ");
    }
    println!("---\n");
}

/// 対話式ラベリングを実行する
pub async fn run_interactive_label(config: &Config, batched: bool, verbose: bool) -> Result<()> {
    let drive = DriveClient::new(&config.drive_token, config.batch_size)?;
    let store = LabelStore::new(&config.supabase_url, &config.supabase_key)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Google Driveから画像一覧を取得中...");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let mut batch_token: Option<String> = None;
    let inventory = if batched {
        let (items, next) = drive.list_page(&config.folder_id, None).await?;
        batch_token = next;
        items
    } else {
        drive.list_all(&config.folder_id).await?
    };
    let labels = store.load_all().await?;
    spinner.finish_and_clear();

    println!(
        "✔ 画像{}枚 / 既存ラベル{}件\n",
        inventory.len(),
        labels.len()
    );

    materialize::clear_temp(&config.temp_dir)?;

    let mut state = SessionState::new(inventory, labels);
    let mut current_side = Side::None;
    let mut last_shown: Option<String> = None;

    print_help(batched);

    loop {
        if state.is_empty() {
            println!(
                "🎉 表示対象の画像がありません（フィルタ: {}）",
                filter_label(state.filter_mode())
            );
            let input = prompt("操作 (f:フィルタ切替 b:次バッチ q:終了)")?;
            match input.trim() {
                "f" => {
                    state.set_filter(toggled(state.filter_mode()));
                    last_shown = None;
                }
                "b" if batched => {
                    load_next_batch(&drive, config, &mut state, &mut batch_token, &mut last_shown)
                        .await;
                }
                "q" | "Q" => break,
                other => println!("  → 無効な操作です: {}", other),
            }
            continue;
        }

        let Some(img) = state.current().cloned() else {
            continue;
        };

        // メモ化は現在カーソルの1枚のみ。カーソルが動いたら再取得する
        if last_shown.as_deref() != Some(img.name.as_str()) {
            match materialize::materialize(&drive, &img, &config.temp_dir, config.max_image_size)
                .await
            {
                Ok(path) => {
                    if verbose {
                        println!("  取得: {} ({})", img.id, img.mime_type);
                    }
                    println!("🖼  {}", path.display());
                    last_shown = Some(img.name.clone());
                    current_side = state.current_label().map(|r| r.side).unwrap_or_default();
                }
                Err(e) => println!("⚠ 画像取得エラー: {}", e),
            }
        }

        println!("[{}/{}] {}", state.cursor() + 1, state.len(), img.name);
        if let Some(existing) = state.current_label() {
            println!("  既存ラベル: {} ({})", existing.description, existing.side);
        }
        println!("  面: {}", current_side);

        let input = prompt("説明")?;

        match parse_label_action(&input, batched) {
            LabelAction::Save(description) => {
                if let Err(e) = validate_description(&description) {
                    println!("⚠ {}", e);
                    continue;
                }
                let record = LabelRecord::new(&img.name, description, current_side);
                match store.upsert(&record).await {
                    Ok(()) => {
                        state.commit_label(record);
                        println!("  ✔ 保存しました\n");
                    }
                    Err(e) => println!("⚠ 保存エラー: {}（状態は変更されていません）", e),
                }
            }
            LabelAction::Skip => {
                if confirm_skip(&img.name)? {
                    let record = LabelRecord::skip(&img.name);
                    match store.upsert(&record).await {
                        Ok(()) => {
                            state.commit_label(record);
                            println!("  → スキップを記録\n");
                        }
                        Err(e) => println!("⚠ 保存エラー: {}（状態は変更されていません）", e),
                    }
                }
            }
            LabelAction::Navigate(direction) => {
                if state.navigate(direction) == NavOutcome::AtBoundary {
                    println!("  → 端に到達しています");
                }
            }
            LabelAction::JumpNextUnlabeled => {
                if state.jump_to_next_unlabeled() == JumpOutcome::Exhausted {
                    println!("  → これ以降に未ラベルはありません");
                }
            }
            LabelAction::JumpFirstUnlabeled => {
                if state.jump_to_first_unlabeled() == JumpOutcome::Exhausted {
                    println!("  → 未ラベルはありません");
                }
            }
            LabelAction::ToggleFilter => {
                state.set_filter(toggled(state.filter_mode()));
                last_shown = None;
                println!("  → フィルタ: {}", filter_label(state.filter_mode()));
            }
            LabelAction::SetSide(side) => {
                current_side = side;
            }
            LabelAction::NextBatch => {
                load_next_batch(&drive, config, &mut state, &mut batch_token, &mut last_shown)
                    .await;
            }
            LabelAction::Quit => break,
            LabelAction::Empty => {
                println!("⚠ 説明を入力してください（スキップは s）");
            }
            LabelAction::Unknown(cmd) => {
                println!("  → 無効な操作です: {}", cmd);
            }
        }
    }

    println!("\n✓ セッションを終了しました");
    Ok(())
}

/// 次のバッチへ進む
///
/// 一覧の差し替えと同時に一時フォルダを空にする。取得に失敗した
/// 場合はトークンを戻し、現在のバッチのまま操作を続けられる。
async fn load_next_batch(
    drive: &DriveClient,
    config: &Config,
    state: &mut SessionState,
    batch_token: &mut Option<String>,
    last_shown: &mut Option<String>,
) {
    let Some(token) = batch_token.take() else {
        println!("  → 次のバッチはありません");
        return;
    };

    match drive.list_page(&config.folder_id, Some(&token)).await {
        Ok((items, next)) => {
            if let Err(e) = materialize::clear_temp(&config.temp_dir) {
                println!("⚠ 一時フォルダ初期化エラー: {}", e);
            }
            *batch_token = next;
            *last_shown = None;
            println!("  → 次のバッチ: {}枚", items.len());
            state.replace_inventory(items);
        }
        Err(e) => {
            *batch_token = Some(token);
            println!("⚠ バッチ取得エラー: {}（現在のバッチを継続します）", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_letter_commands() {
        assert_eq!(
            parse_label_action("n", false),
            LabelAction::Navigate(Direction::Next)
        );
        assert_eq!(
            parse_label_action("p", false),
            LabelAction::Navigate(Direction::Prev)
        );
        assert_eq!(parse_label_action("u", false), LabelAction::JumpNextUnlabeled);
        assert_eq!(parse_label_action("U", false), LabelAction::JumpFirstUnlabeled);
        assert_eq!(parse_label_action("f", false), LabelAction::ToggleFilter);
        assert_eq!(parse_label_action("s", false), LabelAction::Skip);
        assert_eq!(parse_label_action("q", false), LabelAction::Quit);
    }

    #[test]
    fn test_parse_side_selection() {
        assert_eq!(parse_label_action("1", false), LabelAction::SetSide(Side::Front));
        assert_eq!(parse_label_action("2", false), LabelAction::SetSide(Side::Back));
        assert_eq!(parse_label_action("3", false), LabelAction::SetSide(Side::Left));
        assert_eq!(parse_label_action("4", false), LabelAction::SetSide(Side::Right));
        assert_eq!(parse_label_action("5", false), LabelAction::SetSide(Side::None));
    }

    #[test]
    fn test_parse_batch_only_in_batched_mode() {
        assert_eq!(parse_label_action("b", true), LabelAction::NextBatch);
        assert_eq!(
            parse_label_action("b", false),
            LabelAction::Unknown("b".to_string())
        );
    }

    #[test]
    fn test_parse_free_text_is_save() {
        assert_eq!(
            parse_label_action("左ドアに擦り傷", false),
            LabelAction::Save("左ドアに擦り傷".to_string())
        );
        // 前後の空白は落とす
        assert_eq!(
            parse_label_action("  dent on hood  ", false),
            LabelAction::Save("dent on hood".to_string())
        );
    }

    #[test]
    fn test_parse_empty_input() {
        assert_eq!(parse_label_action("", false), LabelAction::Empty);
        assert_eq!(parse_label_action("   ", false), LabelAction::Empty);
    }
}
