use crate::swarm::common::Vec2;
use crate::swarm::voronoi::TessellationCell;

/// 移動目標への意図ベクトルを計算
///
/// 目標方向の単位ベクトルにゲインを掛けます。目標と一致している
/// 場合はゼロベクトルです。
pub fn migration_goal(pos: Vec2, target: Vec2, k_mig: f64) -> Vec2 {
    (target - pos).normalize() * k_mig
}

/// 編隊目標点への意図ベクトルを計算
///
/// 移動目標と異なり正規化せず、目標点までの偏差に比例させます。
/// 編隊では遠い機体ほど速く目標点へ収束させる必要があるためです。
pub fn formation_goal(pos: Vec2, formation_point: Vec2, k_mig: f64) -> Vec2 {
    (formation_point - pos) * k_mig
}

/// カバレッジ（空間分担）の意図ベクトルを計算
///
/// 自分のボロノイ領域の重心へ向かいます。領域が非有界または縮退で
/// 重心が定義できない場合は、ミッション目標点への直接移動に
/// フォールバックします。
pub fn coverage_goal(pos: Vec2, cell: &TessellationCell, fallback_target: Vec2, k_mig: f64) -> Vec2 {
    match cell.centroid() {
        Some(centroid) => migration_goal(pos, centroid, k_mig),
        None => migration_goal(pos, fallback_target, k_mig),
    }
}
