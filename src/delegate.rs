/*
 * The narrow window into the host GUI toolkit. The frame logic never walks
 * the toolkit's widget tree; it only asks for the geometry of the handful of
 * items it was told about, converts native coordinates into scene
 * coordinates, and asks the toolkit to drop any mouse grab.
 */
use crate::types::{ItemId, Point, Rect};

pub trait WindowItemDelegate {
    /// Scene-space bounds of `item`, or `None` when it is hidden or no longer exists.
    fn item_geometry(&self, item: ItemId) -> Option<Rect>;

    /// Releases whichever control currently believes it is pressed or hovered.
    /// Returns `true` if a grab was actually released.
    fn reset_grabbed_control(&self) -> bool;

    /// Converts a native window-local position into scene coordinates, accounting for scaling.
    fn map_from_native(&self, native_local: Point) -> Point;

    fn item_contains(&self, item: ItemId, scene_point: Point) -> bool {
        self.item_geometry(item)
            .is_some_and(|rect| rect.contains(scene_point))
    }
}
