//! Element manipulation handles and geometry
//!
//! Provides the handles for moving, resizing, and rotating elements, and the
//! math that turns a document-space drag delta into new element geometry.
//! Handles are small control points on the element's bounding box.

use doc_model::{rotate_around, Element, ElementId, Point, Rect, MIN_ELEMENT_SIZE};

/// Distance of the rotation handle above the element's top edge
const ROTATION_HANDLE_OFFSET: f32 = 30.0;

/// Type of manipulation handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleType {
    /// Corner handles resize two edges at once
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,

    /// Edge handles resize in one dimension
    Top,
    Bottom,
    Left,
    Right,

    /// Rotation handle (above the element)
    Rotate,

    /// Move handle (the element body)
    Move,
}

impl HandleType {
    /// The eight resize handles, corners first
    pub const RESIZE: [HandleType; 8] = [
        HandleType::TopLeft,
        HandleType::TopRight,
        HandleType::BottomLeft,
        HandleType::BottomRight,
        HandleType::Top,
        HandleType::Bottom,
        HandleType::Left,
        HandleType::Right,
    ];

    pub fn is_resize(&self) -> bool {
        !matches!(self, HandleType::Rotate | HandleType::Move)
    }

    /// Apply a document-space drag delta to `start` geometry.
    ///
    /// Each handle moves the edge(s) it controls: a top or left edge shifts
    /// the position and shrinks the size by the delta, a bottom or right
    /// edge grows the size. Width and height are floored to
    /// [`MIN_ELEMENT_SIZE`] last; position shifts are not re-corrected when
    /// the floor kicks in.
    pub fn resize(&self, start: Rect, delta_x: f32, delta_y: f32) -> Rect {
        let mut rect = start;
        let (left, right, top, bottom) = match self {
            HandleType::TopLeft => (true, false, true, false),
            HandleType::TopRight => (false, true, true, false),
            HandleType::BottomLeft => (true, false, false, true),
            HandleType::BottomRight => (false, true, false, true),
            HandleType::Top => (false, false, true, false),
            HandleType::Bottom => (false, false, false, true),
            HandleType::Left => (true, false, false, false),
            HandleType::Right => (false, true, false, false),
            HandleType::Rotate | HandleType::Move => return start,
        };

        if left {
            rect.x += delta_x;
            rect.width -= delta_x;
        }
        if right {
            rect.width += delta_x;
        }
        if top {
            rect.y += delta_y;
            rect.height -= delta_y;
        }
        if bottom {
            rect.height += delta_y;
        }

        rect.width = rect.width.max(MIN_ELEMENT_SIZE);
        rect.height = rect.height.max(MIN_ELEMENT_SIZE);
        rect
    }
}

/// Manipulation handle with position and type
#[derive(Debug, Clone, PartialEq)]
pub struct ManipulationHandle {
    pub handle_type: HandleType,

    /// Position in page coordinates, rotation applied
    pub position: Point,

    /// Radius of the hit area in page coordinates
    pub size: f32,

    pub element_id: ElementId,
}

impl ManipulationHandle {
    pub fn new(handle_type: HandleType, position: Point, size: f32, element_id: ElementId) -> Self {
        Self { handle_type, position, size, element_id }
    }

    /// Check if a point hits this handle
    pub fn hit_test(&self, point: &Point, tolerance: f32) -> bool {
        let hit_radius = self.size + tolerance;
        point.distance_to(&self.position) <= hit_radius
    }
}

/// Generate the eight resize handles plus the rotation handle for an element.
///
/// Handles follow the element's rotation around its center.
pub fn generate_handles(element: &Element, handle_size: f32) -> Vec<ManipulationHandle> {
    let bounds = element.bounds();
    let center = bounds.center();
    let (left, right, top, bottom) = (bounds.x, bounds.right(), bounds.y, bounds.bottom());

    let positions = [
        (HandleType::TopLeft, Point::new(left, top)),
        (HandleType::TopRight, Point::new(right, top)),
        (HandleType::BottomLeft, Point::new(left, bottom)),
        (HandleType::BottomRight, Point::new(right, bottom)),
        (HandleType::Top, Point::new(center.x, top)),
        (HandleType::Bottom, Point::new(center.x, bottom)),
        (HandleType::Left, Point::new(left, center.y)),
        (HandleType::Right, Point::new(right, center.y)),
        (HandleType::Rotate, Point::new(center.x, top - ROTATION_HANDLE_OFFSET)),
    ];

    positions
        .into_iter()
        .map(|(handle_type, position)| {
            ManipulationHandle::new(
                handle_type,
                rotate_around(position, center, element.rotation),
                handle_size,
                element.id.clone(),
            )
        })
        .collect()
}

/// Whether `point` lies on the element body, taking rotation into account
pub fn hit_body(element: &Element, point: &Point, tolerance: f32) -> bool {
    let bounds = element.bounds();
    let local = rotate_around(*point, bounds.center(), -element.rotation);
    bounds.contains(&local, tolerance)
}

/// Angle of `point` around `center`, in degrees clockwise from the x axis
pub fn angle_around(center: Point, point: Point) -> f32 {
    (point.y - center.y).atan2(point.x - center.x).to_degrees()
}

/// Normalize an angle into `[0, 360)`
pub fn normalize_degrees(degrees: f32) -> f32 {
    let normalized = degrees.rem_euclid(360.0);
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{ElementKind, ShapeContent, ShapeKind};

    fn square() -> Element {
        Element::new(
            1,
            Rect::new(100.0, 100.0, 100.0, 100.0),
            ElementKind::Shape(ShapeContent::new(ShapeKind::Rectangle)),
        )
    }

    #[test]
    fn test_handle_hit_test() {
        let handle = ManipulationHandle::new(
            HandleType::TopLeft,
            Point::new(100.0, 100.0),
            5.0,
            ElementId::from("h"),
        );

        assert!(handle.hit_test(&Point::new(102.0, 102.0), 2.0));
        assert!(!handle.hit_test(&Point::new(120.0, 120.0), 2.0));
    }

    #[test]
    fn test_generate_handles() {
        let handles = generate_handles(&square(), 5.0);
        assert_eq!(handles.len(), 9);
        assert_eq!(
            handles.iter().filter(|handle| handle.handle_type.is_resize()).count(),
            8
        );

        let rotate = handles
            .iter()
            .find(|handle| handle.handle_type == HandleType::Rotate)
            .expect("rotation handle");
        assert_eq!(rotate.position, Point::new(150.0, 70.0));
    }

    #[test]
    fn test_edge_handles_move_only_their_edge() {
        let start = Rect::new(100.0, 100.0, 100.0, 100.0);

        assert_eq!(HandleType::Right.resize(start, 30.0, 50.0), Rect::new(100.0, 100.0, 130.0, 100.0));
        assert_eq!(HandleType::Bottom.resize(start, 30.0, 50.0), Rect::new(100.0, 100.0, 100.0, 150.0));
        assert_eq!(HandleType::Top.resize(start, 30.0, 50.0), Rect::new(100.0, 150.0, 100.0, 50.0));
        assert_eq!(HandleType::Left.resize(start, 30.0, 50.0), Rect::new(130.0, 100.0, 70.0, 100.0));
    }

    #[test]
    fn test_corner_handles_combine_edges() {
        let start = Rect::new(100.0, 100.0, 100.0, 100.0);

        assert_eq!(
            HandleType::TopLeft.resize(start, -10.0, -20.0),
            Rect::new(90.0, 80.0, 110.0, 120.0)
        );
        assert_eq!(
            HandleType::BottomRight.resize(start, 10.0, 20.0),
            Rect::new(100.0, 100.0, 110.0, 120.0)
        );
    }

    #[test]
    fn test_resize_floor_applies_to_every_handle() {
        let start = Rect::new(100.0, 100.0, 100.0, 100.0);
        for handle in HandleType::RESIZE {
            let shrunk = handle.resize(start, 500.0, 500.0);
            let grown_inward = handle.resize(start, -500.0, -500.0);
            for rect in [shrunk, grown_inward] {
                assert!(rect.width >= MIN_ELEMENT_SIZE, "{handle:?} width {}", rect.width);
                assert!(rect.height >= MIN_ELEMENT_SIZE, "{handle:?} height {}", rect.height);
            }
        }

        let floored = HandleType::BottomRight.resize(start, -95.0, -95.0);
        assert_eq!((floored.width, floored.height), (20.0, 20.0));
    }

    #[test]
    fn test_floor_does_not_correct_position() {
        let start = Rect::new(100.0, 100.0, 100.0, 100.0);
        let rect = HandleType::TopLeft.resize(start, 95.0, 95.0);
        assert_eq!(rect, Rect::new(195.0, 195.0, 20.0, 20.0));
    }

    #[test]
    fn test_body_hit_respects_rotation() {
        let mut element = Element::new(
            1,
            Rect::new(0.0, 40.0, 100.0, 20.0),
            ElementKind::Shape(ShapeContent::new(ShapeKind::Rectangle)),
        );
        let above_center = Point::new(50.0, 10.0);
        assert!(!hit_body(&element, &above_center, 0.0));

        element.rotation = 90.0;
        assert!(hit_body(&element, &above_center, 0.0));
    }

    #[test]
    fn test_angles() {
        let center = Point::new(0.0, 0.0);
        assert!((angle_around(center, Point::new(0.0, 10.0)) - 90.0).abs() < 1e-4);
        assert!((normalize_degrees(-90.0) - 270.0).abs() < 1e-4);
        assert_eq!(normalize_degrees(360.0), 0.0);
    }
}
