//! Pure geometry used by selection and manipulation.
//!
//! Everything here is stateless: bounding boxes, rectangle-intersection
//! selection and corner-anchored resizing.

use crate::layer::{Layer, LayerId};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Axis-aligned box in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Xywh {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Xywh {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Box spanned by two arbitrary corner points.
    pub fn from_points(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Same box with non-negative width and height.
    pub fn normalized(&self) -> Self {
        Self::from_points(Point::new(self.x, self.y), Point::new(self.right(), self.bottom()))
    }

    pub fn contains(&self, point: Point) -> bool {
        let b = self.normalized();
        point.x >= b.x && point.x <= b.right() && point.y >= b.y && point.y <= b.bottom()
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

impl From<Xywh> for Rect {
    fn from(b: Xywh) -> Self {
        Rect::new(b.x, b.y, b.right(), b.bottom()).abs()
    }
}

impl From<Rect> for Xywh {
    fn from(rect: Rect) -> Self {
        let rect = rect.abs();
        Self::new(rect.x0, rect.y0, rect.width(), rect.height())
    }
}

/// A resize handle position on a bounding box.
///
/// Corners move two edges, edge midpoints move one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Side {
    pub const ALL: [Side; 8] = [
        Side::TopLeft,
        Side::Top,
        Side::TopRight,
        Side::Right,
        Side::BottomRight,
        Side::Bottom,
        Side::BottomLeft,
        Side::Left,
    ];

    pub fn has_top(self) -> bool {
        matches!(self, Side::Top | Side::TopLeft | Side::TopRight)
    }

    pub fn has_bottom(self) -> bool {
        matches!(self, Side::Bottom | Side::BottomLeft | Side::BottomRight)
    }

    pub fn has_left(self) -> bool {
        matches!(self, Side::Left | Side::TopLeft | Side::BottomLeft)
    }

    pub fn has_right(self) -> bool {
        matches!(self, Side::Right | Side::TopRight | Side::BottomRight)
    }

    pub fn is_corner(self) -> bool {
        matches!(
            self,
            Side::TopLeft | Side::TopRight | Side::BottomLeft | Side::BottomRight
        )
    }
}

/// Smallest box containing every layer, or `None` for no layers.
pub fn bounding_box<'a>(layers: impl IntoIterator<Item = &'a Layer>) -> Option<Xywh> {
    let mut layers = layers.into_iter();
    let first = layers.next()?;

    let mut left = first.x;
    let mut top = first.y;
    let mut right = first.x + first.width;
    let mut bottom = first.y + first.height;

    for layer in layers {
        left = left.min(layer.x);
        top = top.min(layer.y);
        right = right.max(layer.x + layer.width);
        bottom = bottom.max(layer.y + layer.height);
    }

    Some(Xywh::new(left, top, right - left, bottom - top))
}

/// Ids (in `ordered_ids` order) whose layers overlap the rectangle spanned by
/// `origin` and `current`. Ids missing from `layers` are skipped.
pub fn find_intersecting_layers_with_rectangle(
    ordered_ids: &[LayerId],
    layers: &HashMap<LayerId, Layer>,
    origin: Point,
    current: Point,
) -> Vec<LayerId> {
    let selection = Rect::from_points(origin, current);

    ordered_ids
        .iter()
        .filter(|id| {
            layers
                .get(*id)
                .is_some_and(|layer| selection.intersect(layer.rect()).area() > 0.0)
        })
        .cloned()
        .collect()
}

/// Move the edges of `bounds` adjacent to `corner` to `point`.
///
/// Opposite edges stay where they are. Dragging past an opposite edge flips
/// the box instead of collapsing it, so the result always has non-negative
/// width and height.
pub fn resize_bound(bounds: Xywh, corner: Side, point: Point) -> Xywh {
    let mut result = bounds;

    if corner.has_left() {
        result.x = point.x.min(bounds.right());
        result.width = (bounds.right() - point.x).abs();
    }

    if corner.has_right() {
        result.x = point.x.min(bounds.x);
        result.width = (point.x - bounds.x).abs();
    }

    if corner.has_top() {
        result.y = point.y.min(bounds.bottom());
        result.height = (bounds.bottom() - point.y).abs();
    }

    if corner.has_bottom() {
        result.y = point.y.min(bounds.y);
        result.height = (point.y - bounds.y).abs();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::layer::LayerKind;

    fn layer(x: f64, y: f64, w: f64, h: f64) -> Layer {
        Layer::new(LayerKind::Rectangle, Point::new(x, y), w, h, Color::white())
    }

    fn sample_layers() -> (Vec<LayerId>, HashMap<LayerId, Layer>) {
        let ids: Vec<LayerId> = ["a", "b", "c"].into_iter().map(LayerId::from).collect();
        let mut map = HashMap::new();
        map.insert(ids[0].clone(), layer(0.0, 0.0, 50.0, 50.0));
        map.insert(ids[1].clone(), layer(100.0, 100.0, 50.0, 50.0));
        map.insert(ids[2].clone(), layer(300.0, 0.0, 20.0, 20.0));
        (ids, map)
    }

    #[test]
    fn test_bounding_box_empty() {
        assert_eq!(bounding_box(&Vec::<Layer>::new()), None);
    }

    #[test]
    fn test_bounding_box_single_layer() {
        let l = layer(10.0, 20.0, 30.0, 40.0);
        assert_eq!(bounding_box([&l]), Some(l.bounds()));
    }

    #[test]
    fn test_bounding_box_many_layers() {
        let layers = vec![
            layer(10.0, 20.0, 30.0, 40.0),
            layer(-5.0, 50.0, 10.0, 10.0),
            layer(0.0, -10.0, 100.0, 5.0),
        ];
        let expected = Xywh::new(-5.0, -10.0, 105.0, 70.0);
        assert_eq!(bounding_box(&layers), Some(expected));

        let reversed: Vec<&Layer> = layers.iter().rev().collect();
        assert_eq!(bounding_box(reversed), Some(expected));
    }

    #[test]
    fn test_intersection_selects_in_order() {
        let (ids, map) = sample_layers();
        let hit = find_intersecting_layers_with_rectangle(
            &ids,
            &map,
            Point::new(-10.0, -10.0),
            Point::new(120.0, 120.0),
        );
        assert_eq!(hit, vec![LayerId::from("a"), LayerId::from("b")]);
    }

    #[test]
    fn test_intersection_is_undirected() {
        let (ids, map) = sample_layers();
        let pairs = [
            (Point::new(-10.0, -10.0), Point::new(120.0, 120.0)),
            (Point::new(310.0, 5.0), Point::new(40.0, 40.0)),
            (Point::new(0.0, 200.0), Point::new(500.0, 10.0)),
        ];
        for (origin, current) in pairs {
            assert_eq!(
                find_intersecting_layers_with_rectangle(&ids, &map, origin, current),
                find_intersecting_layers_with_rectangle(&ids, &map, current, origin),
            );
        }
    }

    #[test]
    fn test_intersection_requires_overlap_area() {
        let (ids, map) = sample_layers();
        // Touches the right edge of "a" but does not overlap it.
        let hit = find_intersecting_layers_with_rectangle(
            &ids,
            &map,
            Point::new(50.0, 0.0),
            Point::new(60.0, 10.0),
        );
        assert!(hit.is_empty());
    }

    #[test]
    fn test_intersection_skips_missing_layers() {
        let (mut ids, map) = sample_layers();
        ids.insert(0, LayerId::from("stale"));
        let hit = find_intersecting_layers_with_rectangle(
            &ids,
            &map,
            Point::new(0.0, 0.0),
            Point::new(400.0, 400.0),
        );
        assert_eq!(hit.len(), 3);
    }

    #[test]
    fn test_resize_corners_keep_opposite_edges() {
        let bounds = Xywh::new(0.0, 0.0, 100.0, 100.0);
        let point = Point::new(130.0, -20.0);

        let r = resize_bound(bounds, Side::TopLeft, Point::new(30.0, 20.0));
        assert_eq!((r.right(), r.bottom()), (100.0, 100.0));
        assert_eq!((r.x, r.y), (30.0, 20.0));

        let r = resize_bound(bounds, Side::TopRight, point);
        assert_eq!((r.x, r.bottom()), (0.0, 100.0));

        let r = resize_bound(bounds, Side::BottomLeft, Point::new(20.0, 150.0));
        assert_eq!((r.right(), r.y), (100.0, 0.0));

        let r = resize_bound(bounds, Side::BottomRight, Point::new(20.0, 150.0));
        assert_eq!((r.x, r.y), (0.0, 0.0));
        assert_eq!((r.width, r.height), (20.0, 150.0));

        for side in Side::ALL {
            let r = resize_bound(bounds, side, Point::new(-300.0, 400.0));
            assert!(r.width >= 0.0 && r.height >= 0.0, "{side:?}");
        }
    }

    #[test]
    fn test_resize_past_opposite_edge_flips() {
        let bounds = Xywh::new(0.0, 0.0, 100.0, 100.0);
        let r = resize_bound(bounds, Side::BottomRight, Point::new(-40.0, -10.0));
        assert_eq!(r, Xywh::new(-40.0, -10.0, 40.0, 10.0));
    }

    #[test]
    fn test_resize_edge_moves_one_axis() {
        let bounds = Xywh::new(0.0, 0.0, 100.0, 100.0);
        let r = resize_bound(bounds, Side::Right, Point::new(150.0, 999.0));
        assert_eq!(r, Xywh::new(0.0, 0.0, 150.0, 100.0));
        let r = resize_bound(bounds, Side::Top, Point::new(999.0, 25.0));
        assert_eq!(r, Xywh::new(0.0, 25.0, 100.0, 75.0));
    }

    #[test]
    fn test_xywh_rect_conversion() {
        let b = Xywh::new(10.0, 20.0, 30.0, 40.0);
        let rect: Rect = b.into();
        assert_eq!(rect, Rect::new(10.0, 20.0, 40.0, 60.0));
        assert_eq!(Xywh::from(rect), b);
        assert!(b.contains(Point::new(25.0, 30.0)));
        assert!(!b.contains(Point::new(5.0, 30.0)));
    }
}
