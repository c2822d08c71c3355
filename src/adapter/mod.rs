//! Browser-side adapters: the JS render surface, its data payloads and the
//! overlay painter.

pub mod canvas;
pub mod js;
pub mod payload;

pub use canvas::{fill_ops, outline_ops, paint_overlays, PathOp};
pub use js::JsRenderSurface;
pub use payload::{edge_payloads, node_payloads, EdgePayload, NodePayload};
