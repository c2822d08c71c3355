//! Circle overlay geometry.
//!
//! Pure geometry over live node positions: nothing here touches node
//! positions or membership.

mod capsule;
mod entries;
mod hull;

pub use capsule::Capsule;
pub use entries::{
    build_overlay_entries, circle_overlay_style, frame_member_ids, layout_frame, OverlayDraw,
    OverlayEntry, OverlayShape, OverlayStyle,
};
pub use hull::{convex_hull, padded_hull, PaddedHull, Wedge};
