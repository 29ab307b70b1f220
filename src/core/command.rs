use crate::domain::model::{is_present, Message};
use crate::utils::error::{FlowError, Result};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt;

/// How a whitelisted parameter is coerced before it goes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Passed through unchanged.
    Raw,
    Float,
    Integer,
    /// Boolean; `false` still counts as a supplied value.
    Flag,
    /// JSON text is parsed, any other value passed through.
    JsonText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn raw(name: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        kind: FieldKind::Raw,
    }
}

const fn float(name: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        kind: FieldKind::Float,
    }
}

const LIQUID_PARAMS: &[ParamSpec] = &[
    raw("pipetteId"),
    raw("labwareId"),
    raw("wellName"),
    float("volume"),
    float("flowRate"),
    raw("wellLocation"),
    raw("offset"),
];

const BLOWOUT_PARAMS: &[ParamSpec] = &[
    raw("pipetteId"),
    raw("labwareId"),
    raw("wellName"),
    float("flowRate"),
    raw("wellLocation"),
    raw("offset"),
];

const TIP_PARAMS: &[ParamSpec] = &[
    raw("pipetteId"),
    raw("labwareId"),
    raw("wellName"),
    raw("wellLocation"),
    raw("offset"),
];

const MOVE_TO_WELL_PARAMS: &[ParamSpec] = &[
    raw("pipetteId"),
    raw("labwareId"),
    raw("wellName"),
    raw("wellLocation"),
    raw("offset"),
    float("minimumZHeight"),
    ParamSpec {
        name: "forceDirect",
        kind: FieldKind::Flag,
    },
    float("speed"),
];

const MOVE_LABWARE_PARAMS: &[ParamSpec] = &[raw("labwareId"), raw("newLocation"), raw("strategy")];

const LOAD_LABWARE_PARAMS: &[ParamSpec] = &[
    raw("location"),
    raw("loadName"),
    raw("namespace"),
    ParamSpec {
        name: "version",
        kind: FieldKind::Integer,
    },
    raw("labwareId"),
];

const LOAD_PIPETTE_PARAMS: &[ParamSpec] = &[raw("pipetteName"), raw("mount"), raw("pipetteId")];

const HOME_PARAMS: &[ParamSpec] = &[ParamSpec {
    name: "axes",
    kind: FieldKind::JsonText,
}];

const MESSAGE_PARAMS: &[ParamSpec] = &[raw("message")];

const DELAY_PARAMS: &[ParamSpec] = &[float("seconds")];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandType {
    Aspirate,
    Dispense,
    Blowout,
    PickUpTip,
    DropTip,
    MoveToWell,
    MoveLabware,
    LoadLabware,
    LoadPipette,
    Home,
    Pause,
    WaitForResume,
    Delay,
    /// Tag outside the table; sent verbatim with only `msg.params`.
    Other(String),
}

impl CommandType {
    pub const KNOWN: [CommandType; 13] = [
        CommandType::Aspirate,
        CommandType::Dispense,
        CommandType::Blowout,
        CommandType::PickUpTip,
        CommandType::DropTip,
        CommandType::MoveToWell,
        CommandType::MoveLabware,
        CommandType::LoadLabware,
        CommandType::LoadPipette,
        CommandType::Home,
        CommandType::Pause,
        CommandType::WaitForResume,
        CommandType::Delay,
    ];

    pub fn from_tag(tag: &str) -> Self {
        Self::KNOWN
            .iter()
            .find(|known| known.as_str() == tag)
            .cloned()
            .unwrap_or_else(|| CommandType::Other(tag.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            CommandType::Aspirate => "aspirate",
            CommandType::Dispense => "dispense",
            CommandType::Blowout => "blowout",
            CommandType::PickUpTip => "pickUpTip",
            CommandType::DropTip => "dropTip",
            CommandType::MoveToWell => "moveToWell",
            CommandType::MoveLabware => "moveLabware",
            CommandType::LoadLabware => "loadLabware",
            CommandType::LoadPipette => "loadPipette",
            CommandType::Home => "home",
            CommandType::Pause => "pause",
            CommandType::WaitForResume => "waitForResume",
            CommandType::Delay => "delay",
            CommandType::Other(tag) => tag,
        }
    }

    /// Whitelist for this command type; `None` for tags outside the table.
    pub fn params(&self) -> Option<&'static [ParamSpec]> {
        let specs = match self {
            CommandType::Aspirate | CommandType::Dispense => LIQUID_PARAMS,
            CommandType::Blowout => BLOWOUT_PARAMS,
            CommandType::PickUpTip | CommandType::DropTip => TIP_PARAMS,
            CommandType::MoveToWell => MOVE_TO_WELL_PARAMS,
            CommandType::MoveLabware => MOVE_LABWARE_PARAMS,
            CommandType::LoadLabware => LOAD_LABWARE_PARAMS,
            CommandType::LoadPipette => LOAD_PIPETTE_PARAMS,
            CommandType::Home => HOME_PARAMS,
            CommandType::Pause | CommandType::WaitForResume => MESSAGE_PARAMS,
            CommandType::Delay => DELAY_PARAMS,
            CommandType::Other(_) => return None,
        };
        Some(specs)
    }

}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CommandType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequest {
    pub command_type: CommandType,
    pub params: Map<String, Value>,
}

impl CommandRequest {
    /// Builds the command from configured defaults and the event. Event values win;
    /// `msg.params` is merged last.
    pub fn build(
        command_type: CommandType,
        defaults: &Map<String, Value>,
        msg: &Message,
    ) -> Result<Self> {
        let mut params = Map::new();

        if let Some(specs) = command_type.params() {
            for spec in specs {
                if let Some(value) = pick(spec, msg, defaults) {
                    params.insert(spec.name.to_string(), coerce(spec, value)?);
                }
            }
        }

        if let Some(Value::Object(overrides)) = msg.raw_field("params") {
            match command_type.params() {
                Some(specs) => {
                    for (name, value) in overrides {
                        match specs.iter().find(|spec| spec.name == name) {
                            Some(spec) => {
                                params.insert(name.clone(), coerce(spec, value)?);
                            }
                            None => tracing::debug!(
                                "Dropping param '{}' not accepted by {} command",
                                name,
                                command_type
                            ),
                        }
                    }
                }
                // 未知指令類型沒有白名單，原樣送出
                None => params.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone()))),
            }
        }

        Ok(Self {
            command_type,
            params,
        })
    }

    /// Request body for `POST .../commands`.
    pub fn to_body(&self) -> Result<Value> {
        Ok(json!({ "data": serde_json::to_value(self)? }))
    }
}

fn pick<'a>(spec: &ParamSpec, msg: &'a Message, defaults: &'a Map<String, Value>) -> Option<&'a Value> {
    match spec.kind {
        FieldKind::Flag => msg
            .raw_field(spec.name)
            .or_else(|| defaults.get(spec.name).filter(|v| !v.is_null())),
        _ => msg
            .field(spec.name)
            .or_else(|| defaults.get(spec.name).filter(|v| is_present(v))),
    }
}

fn coerce(spec: &ParamSpec, value: &Value) -> Result<Value> {
    match spec.kind {
        FieldKind::Raw | FieldKind::Flag => Ok(value.clone()),
        FieldKind::Float => parse_float(spec.name, value).and_then(|f| number_value(spec.name, f)),
        FieldKind::Integer => parse_integer(spec.name, value).map(Value::from),
        FieldKind::JsonText => match value {
            Value::String(text) => serde_json::from_str(text).map_err(|e| invalid(spec.name, e.to_string())),
            other => Ok(other.clone()),
        },
    }
}

fn parse_float(name: &str, value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| invalid(name, format!("{} is not representable", n))),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(name, format!("'{}' is not a number", s))),
        other => Err(invalid(name, format!("expected a number, got {}", other))),
    }
}

fn parse_integer(name: &str, value: &Value) -> Result<i64> {
    if let Value::Number(n) = value {
        if let Some(i) = n.as_i64() {
            return Ok(i);
        }
    }
    if let Value::String(s) = value {
        if let Ok(i) = s.trim().parse::<i64>() {
            return Ok(i);
        }
    }
    let f = parse_float(name, value)?;
    if !f.is_finite() || f.abs() > i64::MAX as f64 {
        return Err(invalid(name, format!("{} is out of range", f)));
    }
    Ok(f.trunc() as i64)
}

/// Whole numbers go out as JSON integers.
fn number_value(name: &str, f: f64) -> Result<Value> {
    if !f.is_finite() {
        return Err(invalid(name, format!("{} is not a finite number", f)));
    }
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        return Ok(Value::from(f as i64));
    }
    Ok(Value::from(f))
}

fn invalid(name: &str, reason: String) -> FlowError {
    FlowError::InvalidParameter {
        param: name.to_string(),
        reason,
    }
}
