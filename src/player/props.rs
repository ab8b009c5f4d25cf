//! Host property binding
//!
//! The host binding layer delivers view properties as JSON values. This
//! module validates them and routes each one to the matching view operation.

use crate::events::EVENT_NAMES;
use crate::player::session::SourceOptions;
use crate::player::view::PlayerView;
use crate::utils::error::{PlayerViewError, Result};
use log::debug;
use serde_json::Value;

pub const PROP_SRC: &str = "src";
pub const PROP_MUTED: &str = "muted";
pub const PROP_PAUSED: &str = "paused";
pub const PROP_VOLUME: &str = "volume";

const SRC_URI: &str = "uri";
const SRC_OPTIONS: &str = "options";

/// Routes host properties onto a [`PlayerView`]
pub struct PropertyBinder;

impl PropertyBinder {
    /// Apply one property update
    ///
    /// A null `muted`, `paused` or `volume` resets the modifier to its
    /// default.
    ///
    /// # Arguments
    ///
    /// * `view` - View receiving the update
    /// * `name` - Property name, one of `src`, `muted`, `paused` or `volume`
    /// * `value` - Property value as delivered by the host
    ///
    /// # Returns
    ///
    /// `InvalidProperty` for an unknown name or a value of the wrong shape
    pub fn apply(view: &PlayerView, name: &str, value: &Value) -> Result<()> {
        debug!("Property {} = {}", name, value);
        match name {
            PROP_SRC => {
                let (uri, options) = Self::parse_source(value)?;
                view.set_source(uri.as_deref(), options);
            }
            PROP_MUTED => view.set_muted_modifier(bool_or(name, value, false)?),
            PROP_PAUSED => view.set_paused_modifier(bool_or(name, value, false)?),
            PROP_VOLUME => {
                let volume = match value {
                    Value::Null => 1.0,
                    Value::Number(n) => n
                        .as_f64()
                        .ok_or_else(|| PlayerViewError::invalid_property(name, "not a finite number"))?
                        as f32,
                    _ => return Err(PlayerViewError::invalid_property(name, "expected a number")),
                };
                view.set_volume_modifier(volume);
            }
            _ => return Err(PlayerViewError::invalid_property(name, "unknown property")),
        }
        Ok(())
    }

    /// Parse a `src` value into a uri and an option list
    ///
    /// Options are stringified; each call yields a fresh option identity.
    pub fn parse_source(value: &Value) -> Result<(Option<String>, SourceOptions)> {
        let src = value
            .as_object()
            .ok_or_else(|| PlayerViewError::invalid_property(PROP_SRC, "expected an object"))?;

        let uri = match src.get(SRC_URI) {
            Some(Value::String(uri)) => Some(uri.clone()),
            Some(Value::Null) => None,
            Some(_) => {
                return Err(PlayerViewError::invalid_property(PROP_SRC, "uri must be a string"))
            }
            None => return Err(PlayerViewError::invalid_property(PROP_SRC, "missing uri")),
        };

        let options = match src.get(SRC_OPTIONS) {
            None | Some(Value::Null) => SourceOptions::none(),
            Some(Value::Array(items)) => {
                let options = items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => Ok(s.clone()),
                        Value::Number(n) => Ok(n.to_string()),
                        Value::Bool(b) => Ok(b.to_string()),
                        _ => Err(PlayerViewError::invalid_property(
                            PROP_SRC,
                            "options must be scalars",
                        )),
                    })
                    .collect::<Result<Vec<_>>>()?;
                SourceOptions::new(options)
            }
            Some(_) => {
                return Err(PlayerViewError::invalid_property(
                    PROP_SRC,
                    "options must be an array",
                ))
            }
        };

        Ok((uri, options))
    }

    /// Outward event names the host has to register
    pub fn exported_event_names() -> &'static [&'static str] {
        &EVENT_NAMES
    }
}

fn bool_or(name: &str, value: &Value, default: bool) -> Result<bool> {
    match value {
        Value::Null => Ok(default),
        Value::Bool(b) => Ok(*b),
        _ => Err(PlayerViewError::invalid_property(name, "expected a boolean")),
    }
}
