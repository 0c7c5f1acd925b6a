//! WASM bindings for manitour.
//!
//! Exposes tour generation and frame flattening to a JavaScript renderer; all
//! geometry lives in `manitour_core`.

mod tour;

pub use tour::WasmManualTour;
