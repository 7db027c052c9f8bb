use crate::swarm::common::{AgentId, VelocityCommand};
use crate::swarm::traits::{IStateProvider, ProviderError};

/// プロセス内の簡易運動学プロバイダ
///
/// 受け取った速度コマンドを持続時間ぶん等速積分するだけの
/// 最小実装です。セルフテストモードとテストスイートが
/// 外部シミュレータなしでシーケンサを駆動するために使用します。
#[derive(Debug, Clone)]
pub struct KinematicProvider {
    positions: Vec<(f64, f64, f64)>,
}

impl KinematicProvider {
    /// 各機体の初期位置 (x, y, z) から生成
    pub fn new(initial_positions: Vec<(f64, f64, f64)>) -> Self {
        Self {
            positions: initial_positions,
        }
    }

    fn slot(&self, agent: AgentId) -> Result<usize, ProviderError> {
        let index = agent.index();
        if index < self.positions.len() {
            Ok(index)
        } else {
            Err(ProviderError::Unavailable(format!(
                "{} は登録されていません",
                agent
            )))
        }
    }
}

impl IStateProvider for KinematicProvider {
    fn get_position(&self, agent: AgentId) -> Result<(f64, f64, f64), ProviderError> {
        Ok(self.positions[self.slot(agent)?])
    }

    fn get_altitude(&self, agent: AgentId) -> Result<f64, ProviderError> {
        Ok(self.positions[self.slot(agent)?].2)
    }

    fn send_velocity(
        &mut self,
        agent: AgentId,
        command: &VelocityCommand,
    ) -> Result<(), ProviderError> {
        let index = self.slot(agent)?;
        let (x, y, _z) = self.positions[index];
        // 等速直線運動で持続時間ぶん積分。高度は目標値へ即時追従させる
        self.positions[index] = (
            x + command.vx * command.duration,
            y + command.vy * command.duration,
            command.z_cmd,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrates_commands() {
        let mut provider = KinematicProvider::new(vec![(0.0, 0.0, -10.0)]);
        let agent = AgentId::new(1, 1).unwrap();
        let command = VelocityCommand {
            vx: 2.0,
            vy: -1.0,
            z_cmd: -12.0,
            duration: 0.5,
        };
        provider.send_velocity(agent, &command).unwrap();
        let (x, y, z) = provider.get_position(agent).unwrap();
        assert!((x - 1.0).abs() < 1e-12);
        assert!((y + 0.5).abs() < 1e-12);
        assert_eq!(z, -12.0);
    }

    #[test]
    fn test_unknown_agent_is_unavailable() {
        let provider = KinematicProvider::new(vec![(0.0, 0.0, 0.0)]);
        let ghost = AgentId::new(2, 2).unwrap();
        assert!(provider.get_position(ghost).is_err());
    }
}
