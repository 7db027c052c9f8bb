use crate::swarm::common::Vec2;

/// クリップ判定用の許容誤差
const EPS_CLIP: f64 = 1e-9;
/// 同一サイト判定用の許容誤差（二等分線が定義できない距離）
const MIN_BISECTOR_DISTANCE: f64 = 1e-12;

/// 1エージェントに対応するボロノイ領域
///
/// 頂点は反時計回りの多角形です。open = true の領域は本来のボロノイ
/// 領域が非有界であることを示し、有効な重心を持ちません。
#[derive(Debug, Clone, PartialEq)]
pub struct TessellationCell {
    pub vertices: Vec<Vec2>,
    pub open: bool,
}

impl TessellationCell {
    /// 領域の重心（頂点の算術平均）
    ///
    /// 面積重み付きではなく頂点平均による近似です。凸でほぼ正則な
    /// 領域を前提とした許容近似で、非有界・縮退領域ではNoneを
    /// 返します。
    pub fn centroid(&self) -> Option<Vec2> {
        if self.open || self.vertices.len() < 3 {
            return None;
        }
        let mut sum = Vec2::zero();
        for v in &self.vertices {
            sum += *v;
        }
        Some(sum.averaged(self.vertices.len()))
    }
}

/// 全サイトの平面ボロノイ分割を計算
///
/// サイトごとに、十分大きな矩形を他サイトとの垂直二等分線の半平面で
/// 逐次クリップして領域多角形を構成します（O(N^2·頂点数)）。機数が
/// 高々十数機の本用途では掃引法より単純なこの構成で十分です。
/// 重複サイトは二等分線が定義できないためそのクリップをスキップし、
/// 重なった縮退領域として扱います。
pub fn tessellate(sites: &[Vec2]) -> Vec<TessellationCell> {
    if sites.is_empty() {
        return Vec::new();
    }

    let bounds = padded_bounds(sites);

    sites
        .iter()
        .enumerate()
        .map(|(i, &site)| build_cell(i, site, sites, &bounds))
        .collect()
}

/// クリップ開始矩形（サイト群の外接矩形を大きく拡張したもの）
#[derive(Debug, Clone, Copy)]
struct ClipBounds {
    min: Vec2,
    max: Vec2,
}

fn padded_bounds(sites: &[Vec2]) -> ClipBounds {
    let mut min = sites[0];
    let mut max = sites[0];
    for s in sites {
        min.x = min.x.min(s.x);
        min.y = min.y.min(s.y);
        max.x = max.x.max(s.x);
        max.y = max.y.max(s.y);
    }
    // 有界領域の頂点が矩形に触れない程度に広く取る
    let diagonal = (max - min).magnitude();
    let pad = 4.0 * (diagonal + 1.0);
    ClipBounds {
        min: min - Vec2::new(pad, pad),
        max: max + Vec2::new(pad, pad),
    }
}

fn build_cell(self_index: usize, site: Vec2, sites: &[Vec2], bounds: &ClipBounds) -> TessellationCell {
    // 開始多角形は拡張矩形（反時計回り）
    let mut polygon = vec![
        Vec2::new(bounds.min.x, bounds.min.y),
        Vec2::new(bounds.max.x, bounds.min.y),
        Vec2::new(bounds.max.x, bounds.max.y),
        Vec2::new(bounds.min.x, bounds.max.y),
    ];

    for (j, &other) in sites.iter().enumerate() {
        if j == self_index {
            continue;
        }
        let toward_site = site - other;
        if toward_site.magnitude() < MIN_BISECTOR_DISTANCE {
            // 重複サイト: 二等分線が定義できない
            continue;
        }
        let midpoint = (site + other) * 0.5;
        polygon = clip_half_plane(&polygon, midpoint, toward_site);
        if polygon.len() < 3 {
            break;
        }
    }

    // 拡張矩形の辺に頂点が残っていれば、本来の領域は非有界
    let open = polygon.len() < 3 || polygon.iter().any(|v| on_bounds(v, bounds));

    TessellationCell {
        vertices: polygon,
        open,
    }
}

/// 半平面 { p : (p - point)・inward >= 0 } で多角形をクリップ
///
/// Sutherland-Hodgmanの1半平面版。入力が反時計回りなら出力も
/// 反時計回りを維持します。
fn clip_half_plane(polygon: &[Vec2], point: Vec2, inward: Vec2) -> Vec<Vec2> {
    let mut output = Vec::with_capacity(polygon.len() + 1);

    for (k, &current) in polygon.iter().enumerate() {
        let next = polygon[(k + 1) % polygon.len()];
        let d_current = signed_distance(current, point, inward);
        let d_next = signed_distance(next, point, inward);

        if d_current >= -EPS_CLIP {
            output.push(current);
        }
        // 辺が境界をまたぐ場合は交点を追加
        if (d_current > EPS_CLIP && d_next < -EPS_CLIP)
            || (d_current < -EPS_CLIP && d_next > EPS_CLIP)
        {
            let t = d_current / (d_current - d_next);
            output.push(current + (next - current) * t);
        }
    }

    output
}

fn signed_distance(p: Vec2, point: Vec2, inward: Vec2) -> f64 {
    (p.x - point.x) * inward.x + (p.y - point.y) * inward.y
}

fn on_bounds(v: &Vec2, bounds: &ClipBounds) -> bool {
    (v.x - bounds.min.x).abs() < EPS_CLIP
        || (v.x - bounds.max.x).abs() < EPS_CLIP
        || (v.y - bounds.min.y).abs() < EPS_CLIP
        || (v.y - bounds.max.y).abs() < EPS_CLIP
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 点が点集合の凸包内にあるか（全サイトの外接矩形で代用せず、
    /// 2次元クロス積による半平面判定で確認する）
    fn inside_convex_hull(p: Vec2, hull_ccw: &[Vec2]) -> bool {
        hull_ccw.iter().enumerate().all(|(k, &a)| {
            let b = hull_ccw[(k + 1) % hull_ccw.len()];
            let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
            cross >= -1e-9
        })
    }

    #[test]
    fn test_square_lattice_hull_cells_are_open() {
        // 2x2正方格子では全サイトが凸包上にあり、真の領域はすべて非有界
        let sites = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(0.0, 10.0),
            Vec2::new(10.0, 10.0),
        ];
        let cells = tessellate(&sites);
        assert_eq!(cells.len(), 4);
        for cell in &cells {
            assert!(cell.open);
            assert!(cell.centroid().is_none());
        }
    }

    #[test]
    fn test_interior_cell_centroid_inside_hull() {
        // 3x3格子: 中央サイトの領域は有界で、重心は全サイトの凸包内
        let mut sites = Vec::new();
        for gy in 0..3 {
            for gx in 0..3 {
                sites.push(Vec2::new(gx as f64 * 10.0, gy as f64 * 10.0));
            }
        }
        let cells = tessellate(&sites);
        let hull = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(20.0, 0.0),
            Vec2::new(20.0, 20.0),
            Vec2::new(0.0, 20.0),
        ];

        let center_cell = &cells[4];
        assert!(!center_cell.open);
        let centroid = center_cell.centroid().unwrap();
        assert!(inside_convex_hull(centroid, &hull));
        // 中央サイト(10,10)の領域は対称なので重心はサイト位置に一致する
        assert!((centroid.x - 10.0).abs() < 1e-6);
        assert!((centroid.y - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_square_plus_center_bounds_center_cell() {
        let sites = vec![
            Vec2::new(-10.0, -10.0),
            Vec2::new(10.0, -10.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(-10.0, 10.0),
            Vec2::new(0.0, 0.0),
        ];
        let cells = tessellate(&sites);
        // 中心サイトの領域のみ有界
        assert!(!cells[4].open);
        for cell in &cells[..4] {
            assert!(cell.open);
        }
        let centroid = cells[4].centroid().unwrap();
        assert!(centroid.magnitude() < 1e-6);
    }

    #[test]
    fn test_duplicate_sites_do_not_panic() {
        let sites = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
        ];
        let cells = tessellate(&sites);
        assert_eq!(cells.len(), 3);
        // 縮退していてもNaNや空返しでクラッシュしない
        for cell in &cells {
            for v in &cell.vertices {
                assert!(v.x.is_finite() && v.y.is_finite());
            }
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(tessellate(&[]).is_empty());
    }
}
