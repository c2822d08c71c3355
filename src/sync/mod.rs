//! Keeping a stateful render surface in step with the computed graph.

mod controller;
mod headless;
mod strategy;
mod surface;

pub use controller::{EngineState, GraphController, SyncOutcome};
pub use headless::{HeadlessSurface, SurfaceCounters};
pub use strategy::{choose_path, PreviousRender, RenderDiff, SyncPath};
pub use surface::{RenderSurface, SurfaceEvent};
