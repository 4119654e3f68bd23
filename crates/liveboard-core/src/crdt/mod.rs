//! CRDT-backed shared document using Loro.
//!
//! This module is the store every connection writes to. Concurrent writes
//! are merged by Loro, last writer wins per field.
//!
//! # Schema
//!
//! ```text
//! LoroDoc
//! ├── "layers": LoroMap<LayerId, LoroMap> (layer records)
//! └── "layer_ids": LoroList<String> (layer ids in paint order)
//! ```
//!
//! Each layer record is a LoroMap with:
//! - "type": String ("rectangle", "ellipse", "path", "text", "note")
//! - "x", "y", "width", "height": f64
//! - "fill_r", "fill_g", "fill_b": i64 in 0..=255

mod convert;
mod schema;

pub use convert::{layer_from_loro, layer_to_loro, patch_to_loro};
pub use schema::{LAYER_IDS_KEY, LAYERS_KEY, LayerDocument};

pub use loro::VersionVector;

use crate::layer::{Layer, LayerId, LayerPatch};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Document errors.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("CRDT error: {0}")]
    Crdt(#[from] loro::LoroError),
    #[error("Encode error: {0}")]
    Encode(String),
    #[error("Layer limit reached ({0} layers)")]
    LayerLimitReached(usize),
}

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// A single logical change to the layer map and order list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DocumentMutation {
    /// Add a layer and place its id at `index` in the paint order
    /// (appended when `index` is past the end).
    Insert {
        id: LayerId,
        layer: Layer,
        index: usize,
    },
    /// Overwrite the fields set in `patch`.
    Update { id: LayerId, patch: LayerPatch },
    /// Remove a layer and its paint-order entry.
    Delete { id: LayerId },
}

impl DocumentMutation {
    /// The layer this mutation targets.
    pub fn layer_id(&self) -> &LayerId {
        match self {
            DocumentMutation::Insert { id, .. }
            | DocumentMutation::Update { id, .. }
            | DocumentMutation::Delete { id } => id,
        }
    }
}
