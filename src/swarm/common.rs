use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// 水平面（XY平面）上の2次元ベクトルを表す構造体
///
/// 位置・速度・力のいずれにも使用します。高度は群全体で平均化して
/// 別スカラーとして扱うため、制御計算はすべて2次元で行います。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64, // m または m/s
    pub y: f64, // m または m/s
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// ベクトルの大きさ（ノルム）
    pub fn magnitude(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2)).sqrt()
    }

    /// 2点間の距離
    pub fn distance_to(&self, other: &Vec2) -> f64 {
        (*other - *self).magnitude()
    }

    /// ベクトルを正規化（安全版）
    ///
    /// ノルムがゼロの場合はゼロベクトルを返します。一致した位置同士の
    /// 力計算でNaNを発生させないための唯一の正規化経路です。
    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag > 0.0 {
            Self::new(self.x / mag, self.y / mag)
        } else {
            *self
        }
    }

    /// 寄与数による平均化（安全版）
    ///
    /// 近傍数がゼロの場合は除算せずゼロベクトルのまま返します。
    /// 力の平均化はすべてこの経路を通します。
    pub fn averaged(&self, count: usize) -> Self {
        if count > 0 {
            Self::new(self.x / count as f64, self.y / count as f64)
        } else {
            Vec2::zero()
        }
    }

    /// 原点まわりに角度angle（ラジアン）だけ回転
    pub fn rotated(&self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// 速度制限（ノルムを保ったまま最大速度へ縮小）
    pub fn clamp_magnitude(&self, max_speed: f64) -> Self {
        let mag = self.magnitude();
        if mag > max_speed {
            let factor = max_speed / mag;
            Self::new(self.x * factor, self.y * factor)
        } else {
            *self
        }
    }

    /// 速度制限（成分ごとのクリップ）
    ///
    /// 各成分を独立にmax_speedと比較する方式。方向が保存されないため
    /// 既定の制限方式ではなく、ClampPolicy::PerAxisClipを明示的に
    /// 選択したミッションでのみ使用されます。
    pub fn clamp_per_axis(&self, max_speed: f64) -> Self {
        Self::new(self.x.min(max_speed), self.y.min(max_speed))
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

/// エージェントの型付きハンドル（1始まり）
///
/// 旧実装では"UAV3"のような名前文字列から番号を切り出していましたが、
/// 設定読み込み時に検証済みの整数ハンドルに置き換えています。
/// 原点オフセット等のテーブル参照にはindex()（0始まり）を使用します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(u32);

impl AgentId {
    /// 1..=num_agents の範囲内であれば生成
    pub fn new(id: u32, num_agents: u32) -> Option<Self> {
        if (1..=num_agents).contains(&id) {
            Some(Self(id))
        } else {
            None
        }
    }

    /// 全エージェントのハンドルを昇順で列挙
    pub fn all(num_agents: u32) -> impl Iterator<Item = AgentId> {
        (1..=num_agents).map(AgentId)
    }

    /// テーブル参照用の0始まりインデックス
    pub fn index(&self) -> usize {
        (self.0 - 1) as usize
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UAV{}", self.0)
    }
}

/// 速度制限の方式
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClampPolicy {
    /// ノルムが最大速度を超えた場合に方向を保って一様に縮小（既定）
    #[default]
    MagnitudeRescale,
    /// 成分ごとに最大速度でクリップ（旧実装互換の代替方式）
    PerAxisClip,
}

impl ClampPolicy {
    /// 選択された方式で速度ベクトルを制限
    pub fn apply(&self, velocity: Vec2, max_speed: f64) -> Vec2 {
        match self {
            ClampPolicy::MagnitudeRescale => velocity.clamp_magnitude(max_speed),
            ClampPolicy::PerAxisClip => velocity.clamp_per_axis(max_speed),
        }
    }
}

/// 1ティック分の速度コマンド
///
/// 水平速度2成分＋目標高度＋持続時間。毎ティック全エージェント分を
/// 作り直して送信し、ティックをまたいで保持しません。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityCommand {
    pub vx: f64,       // m/s
    pub vy: f64,       // m/s
    pub z_cmd: f64,    // m（目標高度）
    pub duration: f64, // s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_zero_vector() {
        let v = Vec2::zero().normalize();
        assert_eq!(v, Vec2::zero());
        assert!(v.x.is_finite() && v.y.is_finite());
    }

    #[test]
    fn test_averaged_zero_count() {
        let v = Vec2::new(3.0, -4.0);
        assert_eq!(v.averaged(0), Vec2::zero());
        assert_eq!(v.averaged(2), Vec2::new(1.5, -2.0));
    }

    #[test]
    fn test_clamp_magnitude_idempotent() {
        let below = Vec2::new(1.0, 1.0);
        assert_eq!(below.clamp_magnitude(5.0), below);

        let above = Vec2::new(6.0, 8.0);
        let clamped = above.clamp_magnitude(5.0);
        assert!((clamped.magnitude() - 5.0).abs() < 1e-12);
        // 方向保存（cos類似度 = 1.0）
        let cos = (above.x * clamped.x + above.y * clamped.y)
            / (above.magnitude() * clamped.magnitude());
        assert!((cos - 1.0).abs() < 1e-12);
        assert_eq!(clamped.clamp_magnitude(5.0), clamped);
    }

    #[test]
    fn test_clamp_policy_per_axis() {
        let v = Vec2::new(7.0, -3.0);
        let clipped = ClampPolicy::PerAxisClip.apply(v, 5.0);
        assert_eq!(clipped, Vec2::new(5.0, -3.0));
    }

    #[test]
    fn test_rotated_quarter_turn() {
        let v = Vec2::new(1.0, 0.0).rotated(std::f64::consts::FRAC_PI_2);
        assert!((v.x).abs() < 1e-12);
        assert!((v.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_agent_id_range() {
        assert!(AgentId::new(0, 9).is_none());
        assert!(AgentId::new(10, 9).is_none());
        let id = AgentId::new(3, 9).unwrap();
        assert_eq!(id.index(), 2);
        assert_eq!(id.to_string(), "UAV3");
        assert_eq!(AgentId::all(9).count(), 9);
    }
}
