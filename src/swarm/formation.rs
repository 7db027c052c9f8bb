use crate::swarm::common::Vec2;
use serde::{Deserialize, Serialize};

/// 編隊パターンの種類
///
/// 未知のパターン名はYAML読み込み時点でエラーになるため、
/// ティック開始後に不正なパターンへ到達することはありません。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormationPattern {
    /// 群中心を囲む等角度の円形配置
    Circle,
    /// x方向に等間隔の横一列配置
    Line,
    /// 斜め45度の等間隔配置
    Diagonal,
    /// 中央機を先頭とするV字配置
    V,
}

impl std::fmt::Display for FormationPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FormationPattern::Circle => "circle",
            FormationPattern::Line => "line",
            FormationPattern::Diagonal => "diagonal",
            FormationPattern::V => "V",
        };
        write!(f, "{}", name)
    }
}

/// 群中心からの相対オフセットを生成
///
/// 同じ(パターン, 機数, 間隔)に対して常に同じ順序の点列を返す
/// 決定的なジェネレータです。
fn formation_offsets(pattern: FormationPattern, num_agents: usize, spacing: f64) -> Vec<Vec2> {
    match pattern {
        FormationPattern::Circle => {
            let angle_offset = 2.0 * std::f64::consts::PI / num_agents as f64;
            (0..num_agents)
                .map(|i| {
                    let angle = angle_offset * i as f64;
                    Vec2::new(angle.cos(), angle.sin()) * spacing
                })
                .collect()
        }
        FormationPattern::Line => (0..num_agents)
            .map(|i| Vec2::new(i as f64 * spacing, 0.0))
            .collect(),
        FormationPattern::Diagonal => (0..num_agents)
            .map(|i| Vec2::new(i as f64 * spacing, i as f64 * spacing))
            .collect(),
        FormationPattern::V => {
            let half = (num_agents / 2) as i64;
            (0..num_agents)
                .map(|i| {
                    let k = i as i64 - half;
                    Vec2::new(k.abs() as f64 * spacing, k as f64 * spacing)
                })
                .collect()
        }
    }
}

/// 編隊の目標点列を生成
///
/// 各エージェントの目標位置（群中心＋相対オフセット）を機体番号順に
/// 返します。
pub fn formation_points(
    pattern: FormationPattern,
    num_agents: usize,
    spacing: f64,
    group_center: Vec2,
) -> Vec<Vec2> {
    formation_offsets(pattern, num_agents, spacing)
        .into_iter()
        .map(|offset| group_center + offset)
        .collect()
}

/// 回転付きの編隊目標点列を生成
///
/// 相対オフセットを回転行列で回してから群中心に加算します。
/// 回転ミッションでは目標点をキャッシュせず、毎ティック現在の
/// 群中心と回転角から再計算します。
pub fn rotated_formation_points(
    pattern: FormationPattern,
    num_agents: usize,
    spacing: f64,
    group_center: Vec2,
    rotation: f64,
) -> Vec<Vec2> {
    formation_offsets(pattern, num_agents, spacing)
        .into_iter()
        .map(|offset| group_center + offset.rotated(rotation))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generators_are_deterministic() {
        for pattern in [
            FormationPattern::Circle,
            FormationPattern::Line,
            FormationPattern::Diagonal,
            FormationPattern::V,
        ] {
            let a = formation_points(pattern, 9, 10.0, Vec2::zero());
            let b = formation_points(pattern, 9, 10.0, Vec2::zero());
            assert_eq!(a, b, "pattern {} should be restartable", pattern);
            assert_eq!(a.len(), 9);
        }
    }

    #[test]
    fn test_circle_points_on_radius() {
        let points = formation_points(FormationPattern::Circle, 6, 15.0, Vec2::new(3.0, -2.0));
        for p in &points {
            let r = (*p - Vec2::new(3.0, -2.0)).magnitude();
            assert!((r - 15.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_line_is_evenly_spaced() {
        let points = formation_points(FormationPattern::Line, 4, 12.0, Vec2::zero());
        for (i, p) in points.iter().enumerate() {
            assert_eq!(*p, Vec2::new(i as f64 * 12.0, 0.0));
        }
    }

    #[test]
    fn test_v_is_symmetric_about_center_agent() {
        let points = formation_points(FormationPattern::V, 5, 8.0, Vec2::zero());
        // 中央機（i = n/2）が先頭（原点）に立つ
        assert_eq!(points[2], Vec2::zero());
        assert_eq!(points[1].x, points[3].x);
        assert_eq!(points[1].y, -points[3].y);
    }

    #[test]
    fn test_rotation_preserves_offset_length() {
        let base = formation_points(FormationPattern::V, 5, 8.0, Vec2::zero());
        let rotated = rotated_formation_points(FormationPattern::V, 5, 8.0, Vec2::zero(), 1.2);
        for (b, r) in base.iter().zip(&rotated) {
            assert!((b.magnitude() - r.magnitude()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_unknown_pattern_fails_at_parse() {
        let err = serde_yaml::from_str::<FormationPattern>("wedge");
        assert!(err.is_err());
        let ok = serde_yaml::from_str::<FormationPattern>("circle");
        assert_eq!(ok.unwrap(), FormationPattern::Circle);
    }
}
