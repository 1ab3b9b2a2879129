//! ラベリングセッションの状態機械
//!
//! どの画像が「現在」か、フィルタやバッチ切替がその選択をどう変えるか、
//! 保存がキャッシュとカーソルにどう反映されるかをI/Oなしで定義する。
//! 不変条件: 作業セットが空でない限り `0 <= cursor < working_set.len()`。
//!
//! 永続保存との整合は呼び出し側の責務で、ストアへのupsertが成功した
//! 場合にのみ`commit_label`を呼ぶ。失敗時に状態が変わらないのは、
//! ストア呼び出しの前に一切の変更を行わないことで構造的に保証される。

use crate::drive::DriveImage;
use crate::store::LabelRecord;
use std::collections::HashMap;

/// 表示フィルタ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// 全画像
    #[default]
    All,
    /// 未ラベルのみ
    UnlabeledOnly,
}

/// ナビゲーション方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

/// 1ステップ移動の結果（端ではエラーにせず留まる）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    Moved,
    AtBoundary,
}

/// 未ラベル探索の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpOutcome {
    Moved,
    Exhausted,
}

pub struct SessionState {
    /// フィルタの元になる正インベントリ（バッチモードでは現在のバッチ）
    inventory: Vec<DriveImage>,
    working_set: Vec<DriveImage>,
    cursor: usize,
    filter_mode: FilterMode,
    labels: HashMap<String, LabelRecord>,
}

impl SessionState {
    /// セッションを初期化する
    ///
    /// カーソルは最初の未ラベル画像に合わせる（自動レジューム）。
    /// 全てラベル済み、または空の場合は0。
    pub fn new(inventory: Vec<DriveImage>, labels: HashMap<String, LabelRecord>) -> Self {
        let mut state = Self {
            inventory,
            working_set: Vec::new(),
            cursor: 0,
            filter_mode: FilterMode::default(),
            labels,
        };
        state.rebuild_working_set();
        state.cursor = state.first_unlabeled_index().unwrap_or(0);
        state
    }

    fn is_unlabeled(&self, name: &str) -> bool {
        self.labels.get(name).map_or(true, |r| !r.is_labeled())
    }

    fn rebuild_working_set(&mut self) {
        self.working_set = match self.filter_mode {
            FilterMode::All => self.inventory.clone(),
            FilterMode::UnlabeledOnly => self
                .inventory
                .iter()
                .filter(|img| self.is_unlabeled(&img.name))
                .cloned()
                .collect(),
        };
    }

    fn first_unlabeled_index(&self) -> Option<usize> {
        self.working_set
            .iter()
            .position(|img| self.is_unlabeled(&img.name))
    }

    /// フィルタを切り替える
    ///
    /// 常に正インベントリから再計算する（フィルタは重ねがけしない）。
    /// カーソルは0に戻る。
    pub fn set_filter(&mut self, mode: FilterMode) {
        self.filter_mode = mode;
        self.rebuild_working_set();
        self.cursor = 0;
    }

    /// 前後に1ステップ移動。端では留まり`AtBoundary`を返す
    pub fn navigate(&mut self, direction: Direction) -> NavOutcome {
        if self.working_set.is_empty() {
            return NavOutcome::AtBoundary;
        }

        match direction {
            Direction::Prev => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    NavOutcome::Moved
                } else {
                    NavOutcome::AtBoundary
                }
            }
            Direction::Next => {
                if self.cursor + 1 < self.working_set.len() {
                    self.cursor += 1;
                    NavOutcome::Moved
                } else {
                    NavOutcome::AtBoundary
                }
            }
        }
    }

    /// カーソルより後ろの最初の未ラベル画像へ移動
    pub fn jump_to_next_unlabeled(&mut self) -> JumpOutcome {
        let start = self.cursor + 1;
        let found = self
            .working_set
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, img)| self.is_unlabeled(&img.name))
            .map(|(i, _)| i);

        match found {
            Some(i) => {
                self.cursor = i;
                JumpOutcome::Moved
            }
            None => JumpOutcome::Exhausted,
        }
    }

    /// 先頭から数えて最初の未ラベル画像へ移動
    pub fn jump_to_first_unlabeled(&mut self) -> JumpOutcome {
        match self.first_unlabeled_index() {
            Some(i) => {
                self.cursor = i;
                JumpOutcome::Moved
            }
            None => JumpOutcome::Exhausted,
        }
    }

    /// 永続保存が成功したレコードをキャッシュへ反映し、カーソルを進める
    ///
    /// 進みは+1で、末尾では留まる（折り返さない・エラーにしない）。
    pub fn commit_label(&mut self, record: LabelRecord) {
        self.labels.insert(record.image_name.clone(), record);

        if !self.working_set.is_empty() {
            self.cursor = (self.cursor + 1).min(self.working_set.len() - 1);
        }
    }

    /// バッチ切替: インベントリを差し替え、ラベルキャッシュを保ったまま
    /// フィルタ適用と自動レジュームをやり直す
    pub fn replace_inventory(&mut self, inventory: Vec<DriveImage>) {
        self.inventory = inventory;
        self.rebuild_working_set();
        self.cursor = self.first_unlabeled_index().unwrap_or(0);
    }

    /// 現在の画像（空の場合はNone）
    pub fn current(&self) -> Option<&DriveImage> {
        self.working_set.get(self.cursor)
    }

    /// 現在の画像に紐づく既存ラベル
    pub fn current_label(&self) -> Option<&LabelRecord> {
        self.current().and_then(|img| self.labels.get(&img.name))
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.working_set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.working_set.is_empty()
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.filter_mode
    }

    pub fn labels(&self) -> &HashMap<String, LabelRecord> {
        &self.labels
    }

    pub fn working_set(&self) -> &[DriveImage] {
        &self.working_set
    }
}

/// 保存前の説明文チェック（スキップ経路はここを通らない）
pub fn validate_description(description: &str) -> crate::error::Result<()> {
    if description.trim().is_empty() {
        Err(crate::error::LabelerError::Validation(
            "説明が入力されていません".to_string(),
        ))
    } else {
        Ok(())
    }
}
