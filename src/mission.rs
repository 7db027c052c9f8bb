use crate::swarm::common::ClampPolicy;
use crate::swarm::formation::FormationPattern;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// ミッションメタデータ
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MissionMeta {
    pub version: String,
    pub name: String,
    pub description: String,
}

/// 群の構成設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SwarmConfig {
    /// 機数（ミッション中は固定）
    pub num_agents: u32,
    /// 機体ごとの原点オフセット（機体番号順、num_agents個）
    pub origins: Vec<Position2D>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Position2D {
    pub x_m: f64,
    pub y_m: f64,
}

/// 力則のゲイン一式（ミッション中は不変）
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct GainSet {
    /// 最大速度（クランプ上限）
    pub v_max_mps: f64,
    /// 感知半径（これ以遠のペアは力計算の対象外）
    pub r_max_m: f64,
    /// 分離ゲイン
    pub k_sep: f64,
    /// 凝集ゲイン
    pub k_coh: f64,
    /// 移動（目標指向）ゲイン
    pub k_mig: f64,
    /// 反発ゲイン
    pub k_rep: f64,
    /// 反発が働き始める半径
    pub r_repulsion_m: f64,
    /// 機体間の目標距離（ミッションプリセットの間隔下限）
    pub d_desired_m: f64,
}

/// 制御ループ設定
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ControlConfig {
    /// ミッションのティック数
    pub tick_count: u32,
    /// 1コマンドの持続時間（ティックごとに再送出される）
    pub command_duration_s: f64,
}

/// ミッションモード
///
/// モードごとの定数（目標点・間隔・中心半径）は実行時状態ではなく
/// ミッション設定です。未知のモード名・編隊名はYAML解析時点で
/// エラーになります。
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MissionMode {
    /// 固定目標点への移動
    Migration { target: Position2D },
    /// 円軌道を描く群中心まわりの回転編隊
    RotatingFormation {
        pattern: FormationPattern,
        center_radius_m: f64,
        spacing_m: f64,
    },
    /// ボロノイ分割による空間分担（カバレッジ）
    Coverage { target: Position2D },
    /// 横一列編隊のまま固定目標へ向かう捜索
    LineSearch {
        target: Position2D,
        spacing_m: f64,
    },
}

impl MissionMode {
    pub fn name(&self) -> &'static str {
        match self {
            MissionMode::Migration { .. } => "migration",
            MissionMode::RotatingFormation { .. } => "rotating_formation",
            MissionMode::Coverage { .. } => "coverage",
            MissionMode::LineSearch { .. } => "line_search",
        }
    }
}

fn default_repulsion_weight() -> f64 {
    1.0
}

/// 完全なミッション設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MissionConfig {
    pub meta: MissionMeta,
    pub swarm: SwarmConfig,
    pub gains: GainSet,
    pub control: ControlConfig,
    pub mode: MissionMode,
    /// 速度制限の方式（省略時はノルム一様縮小）
    #[serde(default)]
    pub clamp_policy: ClampPolicy,
    /// 集約後の反発力に掛ける重み（省略時1.0）
    #[serde(default = "default_repulsion_weight")]
    pub repulsion_weight: f64,
}

impl MissionConfig {
    /// YAMLファイルからミッション設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MissionError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(MissionError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| MissionError::IoError(path.to_path_buf(), e))?;

        let config: MissionConfig = serde_yaml::from_str(&contents)
            .map_err(|e| MissionError::ParseError(path.to_path_buf(), e))?;

        config.validate()?;

        Ok(config)
    }

    /// 設定の検証
    ///
    /// ミッション開始前に一度だけ呼ばれ、不正な設定は最初のティックが
    /// 走る前に弾きます。
    pub fn validate(&self) -> Result<(), MissionError> {
        if self.swarm.num_agents == 0 {
            return Err(MissionError::ValidationError(
                "num_agents must be at least 1".to_string(),
            ));
        }
        if self.swarm.origins.len() != self.swarm.num_agents as usize {
            return Err(MissionError::ValidationError(format!(
                "origins length {} does not match num_agents {}",
                self.swarm.origins.len(),
                self.swarm.num_agents
            )));
        }

        let g = &self.gains;
        if g.v_max_mps <= 0.0 {
            return Err(MissionError::ValidationError(
                "v_max_mps must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("r_max_m", g.r_max_m),
            ("k_sep", g.k_sep),
            ("k_coh", g.k_coh),
            ("k_mig", g.k_mig),
            ("k_rep", g.k_rep),
            ("r_repulsion_m", g.r_repulsion_m),
            ("d_desired_m", g.d_desired_m),
        ] {
            if value < 0.0 {
                return Err(MissionError::ValidationError(format!(
                    "{} must be non-negative",
                    name
                )));
            }
        }
        if g.r_repulsion_m > g.r_max_m {
            return Err(MissionError::ValidationError(
                "r_repulsion_m must not exceed r_max_m".to_string(),
            ));
        }

        if self.control.tick_count == 0 {
            return Err(MissionError::ValidationError(
                "tick_count must be positive".to_string(),
            ));
        }
        if self.control.command_duration_s <= 0.0 {
            return Err(MissionError::ValidationError(
                "command_duration_s must be positive".to_string(),
            ));
        }
        if self.repulsion_weight < 0.0 {
            return Err(MissionError::ValidationError(
                "repulsion_weight must be non-negative".to_string(),
            ));
        }

        match &self.mode {
            MissionMode::RotatingFormation {
                center_radius_m,
                spacing_m,
                ..
            } => {
                if *spacing_m <= 0.0 || *center_radius_m <= 0.0 {
                    return Err(MissionError::ValidationError(
                        "rotating_formation spacing_m and center_radius_m must be positive"
                            .to_string(),
                    ));
                }
            }
            MissionMode::LineSearch { spacing_m, .. } => {
                if *spacing_m <= 0.0 {
                    return Err(MissionError::ValidationError(
                        "line_search spacing_m must be positive".to_string(),
                    ));
                }
            }
            MissionMode::Migration { .. } | MissionMode::Coverage { .. } => {}
        }

        Ok(())
    }

    /// ミッションの概要を表示
    pub fn print_summary(&self) {
        println!("=== ミッション情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== 群設定 ===");
        println!("機数: {}機", self.swarm.num_agents);
        println!("モード: {}", self.mode.name());
        println!();

        println!("=== 制御設定 ===");
        println!("ティック数: {}", self.control.tick_count);
        println!("コマンド持続時間: {:.2}秒", self.control.command_duration_s);
        println!("最大速度: {:.1} m/s", self.gains.v_max_mps);
        println!("感知半径: {:.1} m", self.gains.r_max_m);
    }
}

/// ミッション設定の読み込みエラー
#[derive(Debug)]
pub enum MissionError {
    FileNotFound(std::path::PathBuf),
    IoError(std::path::PathBuf, std::io::Error),
    ParseError(std::path::PathBuf, serde_yaml::Error),
    ValidationError(String),
}

impl std::fmt::Display for MissionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissionError::FileNotFound(path) => {
                write!(f, "ミッションファイルが見つかりません: {}", path.display())
            }
            MissionError::IoError(path, err) => {
                write!(f, "ファイル読み込みエラー {}: {}", path.display(), err)
            }
            MissionError::ParseError(path, err) => {
                write!(f, "YAML解析エラー {}: {}", path.display(), err)
            }
            MissionError::ValidationError(msg) => {
                write!(f, "設定検証エラー: {}", msg)
            }
        }
    }
}

impl std::error::Error for MissionError {}
