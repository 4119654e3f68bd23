//! Conversion between layers and Loro values.

use crate::color::Color;
use crate::layer::{Layer, LayerKind, LayerPatch};
use loro::{LoroMap, LoroMapValue, LoroResult, LoroValue};

pub(crate) const KEY_TYPE: &str = "type";
pub(crate) const KEY_X: &str = "x";
pub(crate) const KEY_Y: &str = "y";
pub(crate) const KEY_WIDTH: &str = "width";
pub(crate) const KEY_HEIGHT: &str = "height";
pub(crate) const KEY_FILL_R: &str = "fill_r";
pub(crate) const KEY_FILL_G: &str = "fill_g";
pub(crate) const KEY_FILL_B: &str = "fill_b";

fn get_double(map: &LoroMapValue, key: &str) -> Option<f64> {
    match map.get(key)? {
        LoroValue::Double(d) => Some(*d),
        LoroValue::I64(i) => Some(*i as f64),
        _ => None,
    }
}

fn get_byte(map: &LoroMapValue, key: &str) -> Option<u8> {
    match map.get(key)? {
        LoroValue::I64(i) => u8::try_from(*i).ok(),
        LoroValue::Double(d) => Some(d.clamp(0.0, 255.0) as u8),
        _ => None,
    }
}

fn get_string(map: &LoroMapValue, key: &str) -> Option<String> {
    match map.get(key)? {
        LoroValue::String(s) => Some(s.to_string()),
        _ => None,
    }
}

/// Write every field of `layer` into `map`.
pub fn layer_to_loro(layer: &Layer, map: &LoroMap) -> LoroResult<()> {
    map.insert(KEY_TYPE, layer.kind.as_str())?;
    map.insert(KEY_X, layer.x)?;
    map.insert(KEY_Y, layer.y)?;
    map.insert(KEY_WIDTH, layer.width)?;
    map.insert(KEY_HEIGHT, layer.height)?;
    fill_to_loro(layer.fill, map)
}

/// Write only the fields set in `patch`. Each field is its own CRDT entry,
/// so concurrent patches touching different fields both survive a merge.
pub fn patch_to_loro(patch: &LayerPatch, map: &LoroMap) -> LoroResult<()> {
    if let Some(x) = patch.x {
        map.insert(KEY_X, x)?;
    }
    if let Some(y) = patch.y {
        map.insert(KEY_Y, y)?;
    }
    if let Some(width) = patch.width {
        map.insert(KEY_WIDTH, width)?;
    }
    if let Some(height) = patch.height {
        map.insert(KEY_HEIGHT, height)?;
    }
    if let Some(fill) = patch.fill {
        fill_to_loro(fill, map)?;
    }
    Ok(())
}

fn fill_to_loro(fill: Color, map: &LoroMap) -> LoroResult<()> {
    map.insert(KEY_FILL_R, i64::from(fill.r))?;
    map.insert(KEY_FILL_G, i64::from(fill.g))?;
    map.insert(KEY_FILL_B, i64::from(fill.b))?;
    Ok(())
}

/// Read a layer back from its Loro map value.
///
/// Returns `None` for records with an unknown type or missing geometry.
/// A missing fill falls back to white.
pub fn layer_from_loro(map: &LoroMapValue) -> Option<Layer> {
    let kind = LayerKind::parse(&get_string(map, KEY_TYPE)?)?;
    let fill = match (
        get_byte(map, KEY_FILL_R),
        get_byte(map, KEY_FILL_G),
        get_byte(map, KEY_FILL_B),
    ) {
        (Some(r), Some(g), Some(b)) => Color::new(r, g, b),
        _ => Color::white(),
    };

    Some(Layer {
        kind,
        x: get_double(map, KEY_X)?,
        y: get_double(map, KEY_Y)?,
        width: get_double(map, KEY_WIDTH)?,
        height: get_double(map, KEY_HEIGHT)?,
        fill,
    })
}
