use crate::mission::GainSet;
use crate::swarm::common::Vec2;

/// 分離力を計算
///
/// 相手から離れる方向の単位ベクトルにゲインを掛けた、距離に依存しない
/// 一定強度の反発力です。位置が一致している場合（距離ゼロ）は
/// ゼロベクトルを返します。
pub fn separation_force(pos_i: Vec2, pos_j: Vec2, k_sep: f64) -> Vec2 {
    let r_ij = pos_j - pos_i;
    let distance = r_ij.magnitude();
    if distance != 0.0 {
        -(r_ij * (k_sep / distance))
    } else {
        Vec2::zero()
    }
}

/// 凝集力を計算
///
/// 相手へ向かう距離比例の引力。正規化しないため距離とともに無制限に
/// 増大しますが、分離・反発が働かない遠距離で支配的になるよう
/// 意図された特性です。
pub fn cohesion_force(pos_i: Vec2, pos_j: Vec2, k_coh: f64) -> Vec2 {
    (pos_j - pos_i) * k_coh
}

/// 反発力を計算
///
/// 反発半径r_repulsion内でのみ有効な、接近するほど線形に強くなる
/// ばね的な反発力です。距離ゼロは方向が定義できないため
/// ゼロベクトルを返します。
pub fn repulsion_force(pos_i: Vec2, pos_j: Vec2, r_repulsion: f64, k_rep: f64) -> Vec2 {
    let r_ij = pos_j - pos_i;
    let distance = r_ij.magnitude();
    if distance < r_repulsion && distance != 0.0 {
        -(r_ij * (k_rep * (r_repulsion - distance) / distance))
    } else {
        Vec2::zero()
    }
}

/// 1ペア分の近傍力（分離・凝集・反発）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairForces {
    pub separation: Vec2,
    pub cohesion: Vec2,
    pub repulsion: Vec2,
}

/// ペア(i, j)の力をまとめて計算
///
/// 距離が感知半径r_max以上の場合はペアを感知できないためNoneを
/// 返します。距離判定（ゲーティング）はこの関数が所有します。
pub fn pair_forces(pos_i: Vec2, pos_j: Vec2, gains: &GainSet) -> Option<PairForces> {
    let distance = pos_i.distance_to(&pos_j);
    if distance >= gains.r_max_m {
        return None;
    }

    Some(PairForces {
        separation: separation_force(pos_i, pos_j, gains.k_sep),
        cohesion: cohesion_force(pos_i, pos_j, gains.k_coh),
        repulsion: repulsion_force(pos_i, pos_j, gains.r_repulsion_m, gains.k_rep),
    })
}

/// ティック内ローカルの力アキュムレータ
///
/// 旧実装はアキュムレータをインスタンスフィールドとして持ち回り、
/// ティックをまたいだ累積漏れの温床になっていました。本実装では
/// エージェントごと・ティックごとに新規生成するローカル値とし、
/// 集約呼び出しに明示的に渡します。
#[derive(Debug, Default)]
pub struct ForceAccumulator {
    v_sep: Vec2,
    v_coh: Vec2,
    v_rep: Vec2,
    contributing: usize,
}

impl ForceAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 感知半径内のペア力を加算
    pub fn add(&mut self, forces: PairForces) {
        self.v_sep += forces.separation;
        self.v_coh += forces.cohesion;
        self.v_rep += forces.repulsion;
        self.contributing += 1;
    }

    /// 寄与した近傍数
    pub fn contributing(&self) -> usize {
        self.contributing
    }

    /// 各力を寄与近傍数で平均して合算
    ///
    /// 近傍ゼロの場合は平均化をスキップし、正味の近傍力は
    /// ゼロベクトルになります（目標ベクトルのみが残る）。
    pub fn finish(self, repulsion_weight: f64) -> Vec2 {
        let n = self.contributing;
        self.v_sep.averaged(n) + self.v_coh.averaged(n) + (self.v_rep * repulsion_weight).averaged(n)
    }
}

/// エージェントiの近傍力を全ペアにわたって集約
///
/// 感知半径内の寄与分のみを数えて平均します（旧実装は範囲外の相手も
/// 分母に含めてN-1で割っていました）。
pub fn aggregate_neighbor_force(
    self_index: usize,
    positions: &[Vec2],
    gains: &GainSet,
    repulsion_weight: f64,
) -> Vec2 {
    let pos_i = positions[self_index];
    let mut accumulator = ForceAccumulator::new();

    for (j, &pos_j) in positions.iter().enumerate() {
        if j != self_index {
            if let Some(forces) = pair_forces(pos_i, pos_j, gains) {
                accumulator.add(forces);
            }
        }
    }

    accumulator.finish(repulsion_weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_gains() -> GainSet {
        GainSet {
            v_max_mps: 5.0,
            r_max_m: 20.0,
            k_sep: 1.0,
            k_coh: 1.0,
            k_mig: 1.0,
            k_rep: 3.0,
            r_repulsion_m: 2.0,
            d_desired_m: 1.0,
        }
    }

    #[test]
    fn test_coincident_positions_yield_zero_force() {
        let p = Vec2::new(4.0, -2.0);
        let sep = separation_force(p, p, 1.0);
        let rep = repulsion_force(p, p, 5.0, 3.0);
        assert_eq!(sep, Vec2::zero());
        assert_eq!(rep, Vec2::zero());
        assert!(sep.x.is_finite() && rep.x.is_finite());
    }

    #[test]
    fn test_separation_is_unit_magnitude_times_gain() {
        let f = separation_force(Vec2::zero(), Vec2::new(0.0, 10.0), 2.0);
        assert!((f.magnitude() - 2.0).abs() < 1e-12);
        // 相手と逆方向（-y側の相手なら+y…今回は+y側なので-y）
        assert!(f.y < 0.0);
    }

    #[test]
    fn test_repulsion_magnitude_at_unit_distance() {
        // 距離1、反発半径2、k_rep=3 → 強度 3*(2-1) = 3
        let f = repulsion_force(Vec2::zero(), Vec2::new(1.0, 0.0), 2.0, 3.0);
        assert!((f.magnitude() - 3.0).abs() < 1e-12);
        // 押し出される側（i）から見て相手と逆方向
        assert!(f.x < 0.0);
    }

    #[test]
    fn test_repulsion_inactive_outside_radius() {
        let f = repulsion_force(Vec2::zero(), Vec2::new(3.0, 0.0), 2.0, 3.0);
        assert_eq!(f, Vec2::zero());
    }

    #[test]
    fn test_pair_forces_gated_by_sensing_radius() {
        let gains = test_gains();
        assert!(pair_forces(Vec2::zero(), Vec2::new(25.0, 0.0), &gains).is_none());
        assert!(pair_forces(Vec2::zero(), Vec2::new(5.0, 0.0), &gains).is_some());
    }

    #[test]
    fn test_empty_neighborhood_force_is_zero() {
        let gains = test_gains();
        // 他機はすべて感知半径外
        let positions = vec![
            Vec2::zero(),
            Vec2::new(100.0, 0.0),
            Vec2::new(0.0, 100.0),
        ];
        let force = aggregate_neighbor_force(0, &positions, &gains, 1.0);
        assert_eq!(force, Vec2::zero());
    }

    #[test]
    fn test_aggregate_divides_by_contributing_count_only() {
        let gains = GainSet {
            k_sep: 0.0,
            k_coh: 1.0,
            k_rep: 0.0,
            ..test_gains()
        };
        // 感知半径内は1機のみ。凝集力はその1機分そのもの（平均の分母は1）
        let positions = vec![
            Vec2::zero(),
            Vec2::new(10.0, 0.0),
            Vec2::new(500.0, 0.0),
        ];
        let force = aggregate_neighbor_force(0, &positions, &gains, 1.0);
        assert!((force.x - 10.0).abs() < 1e-12);
        assert_eq!(force.y, 0.0);
    }

    #[test]
    fn test_repulsion_weight_scales_only_repulsion() {
        let gains = GainSet {
            k_sep: 0.0,
            k_coh: 0.0,
            ..test_gains()
        };
        let positions = vec![Vec2::zero(), Vec2::new(1.0, 0.0)];
        let single = aggregate_neighbor_force(0, &positions, &gains, 1.0);
        let doubled = aggregate_neighbor_force(0, &positions, &gains, 2.0);
        assert!((doubled.magnitude() - 2.0 * single.magnitude()).abs() < 1e-12);
    }
}
