//! # Sequencer モジュール
//!
//! 群制御のミッションシーケンサを提供します。
//!
//! このモジュールは、固定ティック数の制御ループを管理し、外部の状態
//! プロバイダから取得した全機の位置をもとに、近傍力（分離・凝集・反発）
//! と目標ベクトル（移動・編隊・カバレッジ）を合成して、毎ティック
//! 1機につき1つの速度コマンドを送出します。
//!
//! ## ティックごとの処理順序
//!
//! 1. **状態取得**: 全機の位置（原点オフセット適用）と平均高度の取得
//! 2. **目標計算**: 現在のミッションモードに応じた目標ベクトルの生成
//! 3. **力の集約**: 感知半径内のペア力を寄与数で平均して合算
//! 4. **速度制限**: 選択されたClampPolicyによるクランプ
//! 5. **コマンド送出**: 固定持続時間付きの速度＋高度コマンドを全機へ
//!
//! コマンドバッファはティックごとに新規生成され、ティックをまたいだ
//! 持ち越しはありません。プロバイダの失敗は当該ミッションの中断を
//! 意味し、再試行は行いません。

use crate::mission::{MissionConfig, MissionMode};
use crate::swarm::common::{AgentId, Vec2, VelocityCommand};
use crate::swarm::forces::aggregate_neighbor_force;
use crate::swarm::formation::{formation_points, rotated_formation_points, FormationPattern};
use crate::swarm::goal::{coverage_goal, formation_goal, migration_goal};
use crate::swarm::traits::{IStateProvider, ProviderError};
use crate::swarm::voronoi::tessellate;
use tracing::{debug, info, trace};

pub struct MissionSequencer<P: IStateProvider> {
    pub config: MissionConfig,
    provider: P,
    current_tick: u32,
    verbose_level: u8,
    /// 捜索ミッションの初期編隊点（initialize時に1度だけ計算）
    line_anchor: Option<Vec<Vec2>>,
}

impl<P: IStateProvider> MissionSequencer<P> {
    pub fn new(config: MissionConfig, provider: P, verbose_level: u8) -> Self {
        Self {
            config,
            provider,
            current_tick: 0,
            verbose_level,
            line_anchor: None,
        }
    }

    /// プロバイダへの参照（テスト・検証用）
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// ミッション開始前の準備
    ///
    /// 捜索ミッションでは開始時の群中心を基準に初期編隊点を確定します。
    /// この点列はミッション不変のパラメータで、以後のティックでは
    /// 目標点とのずれ分だけ平行移動されます。
    pub fn initialize(&mut self) -> Result<(), ProviderError> {
        if self.verbose_level > 0 {
            info!("ミッションシーケンサを初期化中...");
            info!("  モード: {}", self.config.mode.name());
            info!("  機数: {}機", self.config.swarm.num_agents);
        }

        if let MissionMode::LineSearch { spacing_m, .. } = self.config.mode {
            let (positions, _) = self.read_swarm_state()?;
            let center = group_center(&positions);
            let anchors = formation_points(
                FormationPattern::Line,
                positions.len(),
                spacing_m,
                center,
            );
            if self.verbose_level > 1 {
                debug!(
                    "初期編隊点を確定: 群中心 ({:.1}, {:.1})",
                    center.x, center.y
                );
            }
            self.line_anchor = Some(anchors);
        }

        Ok(())
    }

    /// ミッションを最後のティックまで実行
    pub fn run(&mut self) -> Result<(), ProviderError> {
        info!("=== ミッション実行開始: {} ===", self.config.meta.name);

        let tick_count = self.config.control.tick_count;
        while self.current_tick < tick_count {
            self.step()?;

            if self.verbose_level > 2 {
                trace!("ティック: {}/{}", self.current_tick, tick_count);
            }

            if self.current_tick % 100 == 0 && self.verbose_level > 0 {
                let progress = (self.current_tick as f64 / tick_count as f64) * 100.0;
                info!("進行状況: {:.1}% ({}/{})", progress, self.current_tick, tick_count);
            }
        }

        info!("=== ミッション完了 ===");
        info!("総ティック数: {}", self.current_tick);

        Ok(())
    }

    /// 1ティック分の処理
    ///
    /// 送出したコマンドバッファを返します（検証用）。バッファは
    /// 毎ティック新規生成され、前ティックの値は残りません。
    pub fn step(&mut self) -> Result<Vec<VelocityCommand>, ProviderError> {
        let (positions, z_cmd) = self.read_swarm_state()?;
        let goals = self.compute_goals(&positions);

        let gains = self.config.gains;
        let duration = self.config.control.command_duration_s;
        let mut commands = Vec::with_capacity(positions.len());

        for (i, goal) in goals.iter().enumerate() {
            let force =
                aggregate_neighbor_force(i, &positions, &gains, self.config.repulsion_weight);
            let raw = force + *goal;
            let limited = self.config.clamp_policy.apply(raw, gains.v_max_mps);

            commands.push(VelocityCommand {
                vx: limited.x,
                vy: limited.y,
                z_cmd,
                duration,
            });
        }

        for (agent, command) in AgentId::all(self.config.swarm.num_agents).zip(&commands) {
            self.provider.send_velocity(agent, command)?;
        }

        self.current_tick += 1;
        Ok(commands)
    }

    /// 全機の位置と平均高度を取得
    ///
    /// プロバイダの返す位置は地上真値なので、機体ごとの原点オフセットを
    /// 読み出し時に一度だけ加算します。
    fn read_swarm_state(&self) -> Result<(Vec<Vec2>, f64), ProviderError> {
        let num_agents = self.config.swarm.num_agents;
        let mut positions = Vec::with_capacity(num_agents as usize);
        let mut altitude_sum = 0.0;

        for agent in AgentId::all(num_agents) {
            let (x, y, z) = self.provider.get_position(agent)?;
            let origin = self.config.swarm.origins[agent.index()];
            positions.push(Vec2::new(x + origin.x_m, y + origin.y_m));
            altitude_sum += z;
        }

        let z_cmd = altitude_sum / num_agents as f64;
        Ok((positions, z_cmd))
    }

    /// ミッションモードに応じた目標ベクトルを全機分計算
    fn compute_goals(&self, positions: &[Vec2]) -> Vec<Vec2> {
        let k_mig = self.config.gains.k_mig;

        match &self.config.mode {
            MissionMode::Migration { target } => {
                let target = Vec2::new(target.x_m, target.y_m);
                positions
                    .iter()
                    .map(|&pos| migration_goal(pos, target, k_mig))
                    .collect()
            }
            MissionMode::RotatingFormation {
                pattern,
                center_radius_m,
                spacing_m,
            } => {
                // 群中心は1ミッションかけて円軌道を1周する
                let angle = 2.0 * std::f64::consts::PI * self.current_tick as f64
                    / self.config.control.tick_count as f64;
                let center = Vec2::new(angle.cos(), angle.sin()) * *center_radius_m;
                // 円形配置は回転対称なので向きの追従は不要
                let rotation = match pattern {
                    FormationPattern::Circle => 0.0,
                    _ => angle - std::f64::consts::FRAC_PI_2,
                };
                let points = rotated_formation_points(
                    *pattern,
                    positions.len(),
                    *spacing_m,
                    center,
                    rotation,
                );
                positions
                    .iter()
                    .zip(&points)
                    .map(|(&pos, &point)| formation_goal(pos, point, k_mig))
                    .collect()
            }
            MissionMode::Coverage { target } => {
                let target = Vec2::new(target.x_m, target.y_m);
                let cells = tessellate(positions);
                positions
                    .iter()
                    .zip(&cells)
                    .map(|(&pos, cell)| coverage_goal(pos, cell, target, k_mig))
                    .collect()
            }
            MissionMode::LineSearch { target, spacing_m } => {
                let target = Vec2::new(target.x_m, target.y_m);
                let center = group_center(positions);
                let shift = target - center;
                // initialize前にstepが呼ばれた場合は現在の群中心から生成
                let anchors = match &self.line_anchor {
                    Some(anchors) => anchors.clone(),
                    None => formation_points(
                        FormationPattern::Line,
                        positions.len(),
                        *spacing_m,
                        center,
                    ),
                };
                positions
                    .iter()
                    .zip(&anchors)
                    .map(|(&pos, &anchor)| formation_goal(pos, anchor + shift, k_mig))
                    .collect()
            }
        }
    }
}

/// 群中心（全機位置の平均）
fn group_center(positions: &[Vec2]) -> Vec2 {
    let mut sum = Vec2::zero();
    for p in positions {
        sum += *p;
    }
    sum.averaged(positions.len())
}
