//! Render surface backed by a JavaScript host object.
//!
//! The host wraps the actual renderer (a vis-network instance and its data
//! sets) and exposes `setData`, `updateNodes`, `removeNodes`, `updateEdges`,
//! `removeEdges`, `getPositions`, `getViewPosition`, `getScale`, `moveTo`,
//! `fit`, `selectNodes`, `setPhysics` and `armSettleFreeze`. An optional
//! `isReady` reports whether the renderer exists yet.

use js_sys::{Array, Function, Reflect};
use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::{JsCast, JsValue};

use super::payload::{edge_payloads, node_payloads};
use crate::config::EngineConfig;
use crate::error::SurfaceError;
use crate::graph::{GraphEdge, NodeColor, Point, PositionMap, VisibleNode};
use crate::sync::RenderSurface;

fn js_message(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

pub struct JsRenderSurface {
    host: JsValue,
    config: EngineConfig,
    base: NodeColor,
}

impl JsRenderSurface {
    pub fn new(host: JsValue, config: EngineConfig) -> Self {
        Self {
            host,
            config,
            base: NodeColor::base(),
        }
    }

    pub fn set_config(&mut self, config: EngineConfig) {
        self.config = config;
    }

    fn method(&self, name: &'static str) -> Result<Option<Function>, SurfaceError> {
        if self.host.is_null() || self.host.is_undefined() {
            return Err(SurfaceError::NotReady);
        }
        let value = Reflect::get(&self.host, &JsValue::from_str(name)).map_err(|e| SurfaceError::Js {
            method: name,
            message: js_message(&e),
        })?;
        Ok(value.dyn_into::<Function>().ok())
    }

    fn call(&self, name: &'static str, args: &[JsValue]) -> Result<JsValue, SurfaceError> {
        let function = self.method(name)?.ok_or_else(|| SurfaceError::Js {
            method: name,
            message: "not a function".to_string(),
        })?;
        let args: Array = args.iter().collect();
        function.apply(&self.host, &args).map_err(|e| SurfaceError::Js {
            method: name,
            message: js_message(&e),
        })
    }

    fn encode<T: Serialize + ?Sized>(name: &'static str, value: &T) -> Result<JsValue, SurfaceError> {
        serde_wasm_bindgen::to_value(value).map_err(|e| SurfaceError::Js {
            method: name,
            message: e.to_string(),
        })
    }

    fn decode<T: DeserializeOwned>(name: &'static str, value: JsValue) -> Result<T, SurfaceError> {
        serde_wasm_bindgen::from_value(value).map_err(|e| SurfaceError::Js {
            method: name,
            message: e.to_string(),
        })
    }
}

impl RenderSurface for JsRenderSurface {
    fn is_ready(&self) -> bool {
        match self.method("isReady") {
            Ok(Some(is_ready)) => is_ready
                .call0(&self.host)
                .ok()
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            Ok(None) => true,
            Err(_) => false,
        }
    }

    fn set_data(&mut self, nodes: &[VisibleNode], edges: &[GraphEdge]) -> Result<(), SurfaceError> {
        const NAME: &str = "setData";
        let nodes = Self::encode(NAME, &node_payloads(nodes, &self.base))?;
        let edges = Self::encode(NAME, &edge_payloads(edges, &self.config))?;
        self.call(NAME, &[nodes, edges]).map(drop)
    }

    fn update_nodes(&mut self, nodes: &[VisibleNode]) -> Result<(), SurfaceError> {
        const NAME: &str = "updateNodes";
        let nodes = Self::encode(NAME, &node_payloads(nodes, &self.base))?;
        self.call(NAME, &[nodes]).map(drop)
    }

    fn remove_nodes(&mut self, ids: &[String]) -> Result<(), SurfaceError> {
        const NAME: &str = "removeNodes";
        let ids = Self::encode(NAME, ids)?;
        self.call(NAME, &[ids]).map(drop)
    }

    fn update_edges(&mut self, edges: &[GraphEdge]) -> Result<(), SurfaceError> {
        const NAME: &str = "updateEdges";
        let edges = Self::encode(NAME, &edge_payloads(edges, &self.config))?;
        self.call(NAME, &[edges]).map(drop)
    }

    fn remove_edges(&mut self, ids: &[String]) -> Result<(), SurfaceError> {
        const NAME: &str = "removeEdges";
        let ids = Self::encode(NAME, ids)?;
        self.call(NAME, &[ids]).map(drop)
    }

    fn positions(&self, ids: &[String]) -> Result<PositionMap, SurfaceError> {
        const NAME: &str = "getPositions";
        let ids = Self::encode(NAME, ids)?;
        let value = self.call(NAME, &[ids])?;
        if value.is_null() || value.is_undefined() {
            return Ok(PositionMap::new());
        }
        Self::decode(NAME, value)
    }

    fn view_position(&self) -> Result<Point, SurfaceError> {
        const NAME: &str = "getViewPosition";
        Self::decode(NAME, self.call(NAME, &[])?)
    }

    fn scale(&self) -> Result<f64, SurfaceError> {
        const NAME: &str = "getScale";
        self.call(NAME, &[])?.as_f64().ok_or_else(|| SurfaceError::Js {
            method: NAME,
            message: "scale is not a number".to_string(),
        })
    }

    fn move_to(&mut self, position: Point, scale: f64) -> Result<(), SurfaceError> {
        const NAME: &str = "moveTo";
        let position = Self::encode(NAME, &position)?;
        self.call(NAME, &[position, JsValue::from_f64(scale)]).map(drop)
    }

    fn fit(&mut self) -> Result<(), SurfaceError> {
        self.call("fit", &[]).map(drop)
    }

    fn select_nodes(&mut self, ids: &[String]) -> Result<(), SurfaceError> {
        const NAME: &str = "selectNodes";
        let ids = Self::encode(NAME, ids)?;
        self.call(NAME, &[ids]).map(drop)
    }

    fn set_physics(&mut self, enabled: bool) -> Result<(), SurfaceError> {
        self.call("setPhysics", &[JsValue::from_bool(enabled)]).map(drop)
    }

    fn arm_settle_freeze(&mut self) -> Result<(), SurfaceError> {
        self.call("armSettleFreeze", &[]).map(drop)
    }
}
