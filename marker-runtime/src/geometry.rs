//! # Geometry 模块
//!
//! 标记几何数据：点、折线、多边形。坐标均为经纬度（经度在前）。
//!
//! 几何只在构造时做校验（最少点数 / 环数），之后作为整体值被替换，
//! 不做任何增量修改。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 折线最少点数
pub const MIN_POLYLINE_POINTS: usize = 2;

/// 多边形单个环最少点数
pub const MIN_RING_POINTS: usize = 3;

/// 地理坐标（经度, 纬度）
///
/// 序列化为 `[lng, lat]`，与 GeoJSON 的坐标顺序一致。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    /// 经度
    pub lng: f64,
    /// 纬度
    pub lat: f64,
}

impl LngLat {
    /// 创建新的坐标
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// 线性插值
    ///
    /// 按经度、纬度分量分别插值，不做大圆修正。
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            lng: self.lng + (other.lng - self.lng) * t,
            lat: self.lat + (other.lat - self.lat) * t,
        }
    }
}

impl From<[f64; 2]> for LngLat {
    fn from([lng, lat]: [f64; 2]) -> Self {
        Self { lng, lat }
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(c: LngLat) -> Self {
        [c.lng, c.lat]
    }
}

impl From<(f64, f64)> for LngLat {
    fn from((lng, lat): (f64, f64)) -> Self {
        Self { lng, lat }
    }
}

/// 几何类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    Polyline,
    Polygon,
}

impl std::fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GeometryKind::Point => "point",
            GeometryKind::Polyline => "polyline",
            GeometryKind::Polygon => "polygon",
        };
        f.write_str(name)
    }
}

/// 几何校验错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// 折线点数不足
    #[error("折线至少需要 {required} 个点，实际 {actual} 个")]
    TooFewPoints { required: usize, actual: usize },

    /// 多边形没有任何环
    #[error("多边形至少需要一个外环")]
    NoRings,

    /// 多边形某个环点数不足
    #[error("多边形第 {ring} 个环至少需要 {required} 个点，实际 {actual} 个")]
    RingTooShort {
        ring: usize,
        required: usize,
        actual: usize,
    },
}

/// 标记几何
///
/// 第一个环是外边界，之后的环是洞。洞是否被外环包含不在这里校验，
/// 由渲染端自行处理。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    /// 单点
    Point(LngLat),
    /// 折线（有序点列）
    Polyline(Vec<LngLat>),
    /// 多边形（外环 + 洞）
    Polygon(Vec<Vec<LngLat>>),
}

impl Geometry {
    /// 创建点几何
    pub fn point(coord: impl Into<LngLat>) -> Self {
        Self::Point(coord.into())
    }

    /// 创建折线几何
    pub fn polyline(coords: Vec<LngLat>) -> Result<Self, GeometryError> {
        if coords.len() < MIN_POLYLINE_POINTS {
            return Err(GeometryError::TooFewPoints {
                required: MIN_POLYLINE_POINTS,
                actual: coords.len(),
            });
        }
        Ok(Self::Polyline(coords))
    }

    /// 创建多边形几何
    pub fn polygon(rings: Vec<Vec<LngLat>>) -> Result<Self, GeometryError> {
        if rings.is_empty() {
            return Err(GeometryError::NoRings);
        }
        if let Some((ring, points)) = rings
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() < MIN_RING_POINTS)
        {
            return Err(GeometryError::RingTooShort {
                ring,
                required: MIN_RING_POINTS,
                actual: points.len(),
            });
        }
        Ok(Self::Polygon(rings))
    }

    /// 几何类型
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::Polyline(_) => GeometryKind::Polyline,
            Geometry::Polygon(_) => GeometryKind::Polygon,
        }
    }

    /// 如果是点几何，返回其坐标
    pub fn as_point(&self) -> Option<LngLat> {
        match self {
            Geometry::Point(c) => Some(*c),
            _ => None,
        }
    }

    /// 坐标总数
    pub fn coordinate_count(&self) -> usize {
        match self {
            Geometry::Point(_) => 1,
            Geometry::Polyline(coords) => coords.len(),
            Geometry::Polygon(rings) => rings.iter().map(Vec::len).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(n: usize) -> Vec<LngLat> {
        (0..n).map(|i| LngLat::new(i as f64, (i * 2) as f64)).collect()
    }

    #[test]
    fn test_lerp() {
        let a = LngLat::new(0.0, 10.0);
        let b = LngLat::new(10.0, 20.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 0.5), LngLat::new(5.0, 15.0));
        assert_eq!(a.lerp(b, 1.0), b);
    }

    #[test]
    fn test_polyline_min_points() {
        let one = vec![LngLat::new(1.0, 1.0)];
        assert_eq!(
            Geometry::polyline(one),
            Err(GeometryError::TooFewPoints {
                required: 2,
                actual: 1
            })
        );

        let two = vec![LngLat::new(1.0, 1.0), LngLat::new(2.0, 2.0)];
        let geom = Geometry::polyline(two).unwrap();
        assert_eq!(geom.kind(), GeometryKind::Polyline);
        assert_eq!(geom.coordinate_count(), 2);
    }

    #[test]
    fn test_polygon_validation() {
        assert_eq!(Geometry::polygon(vec![]), Err(GeometryError::NoRings));

        // 洞的点数不足
        let err = Geometry::polygon(vec![ring(4), ring(2)]).unwrap_err();
        assert_eq!(
            err,
            GeometryError::RingTooShort {
                ring: 1,
                required: 3,
                actual: 2
            }
        );

        let geom = Geometry::polygon(vec![ring(4), ring(3)]).unwrap();
        assert_eq!(geom.kind(), GeometryKind::Polygon);
        assert_eq!(geom.coordinate_count(), 7);
        assert_eq!(geom.as_point(), None);
    }

    #[test]
    fn test_serialize_as_geojson_like() {
        let geom = Geometry::point((13.4, 52.5));
        let json = serde_json::to_string(&geom).unwrap();
        assert_eq!(json, r#"{"type":"Point","coordinates":[13.4,52.5]}"#);

        let back: Geometry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, geom);
    }
}
