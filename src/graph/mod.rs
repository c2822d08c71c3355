//! Graph computation: indexes, neighbor expansion, the filter and expansion
//! engine, node styling and change signatures.

mod edge;
mod engine;
mod hash;
mod index;
mod neighbor;
mod node;
mod signature;
mod style;

pub use edge::{EdgeKind, EdgeStats, EdgeStyle, GraphEdge};
pub use engine::{CircleFilterEntry, GraphEngine, GraphStats, VisibleGraph};
pub use hash::{fold_str, hash_offset, hue, string_hash};
pub use index::{CircleForest, CircleIndex, ForestEntry, GroupIndex, Indexes};
pub use neighbor::{expand_by_depth, EdgeListKey, NeighborCache, NeighborGraph};
pub use node::{hub_id, NodeKind, Point, PositionMap, VisibleNode};
pub use signature::{GraphSignature, SignatureBuilder};
pub use style::{group_color, style_for, NodeColor, NodeStyle, Shadow, StyleInput, StyleRule, STYLE_RULES};
