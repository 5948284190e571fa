//! Wire protocol between native code and hosted script.
//!
//! Messages are semicolon-delimited strings with exactly four fields:
//! - **script -> native** Invoke: `ipc;<seq>;<name>;<payload>`
//! - **native -> script** Resolve: `<internal|external>;<status>;<seq>;<payload>`
//!
//! Payloads are `base64(json(value))` except for two fast paths: the
//! `contextMenu` binding sends `key:value_key:value` pairs, and `internal`
//! resolutions carry a raw string. Events and menu selections have no string
//! framing of their own; they are rendered straight to script (see
//! [`crate::script`]).
//!
//! Everything here is pure and allocation-only.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;
use tether_common::CodecError;

/// Correlates a hosted-script call with its resolution.
pub type Sequence = u64;

/// Tag opening every Invoke message.
pub const INVOKE_TAG: &str = "ipc";

/// Binding whose arguments travel as flattened pairs instead of base64 JSON.
pub const CONTEXT_MENU_BINDING: &str = "contextMenu";

const FIELD_COUNT: usize = 4;

// =============================================================================
// MESSAGE TYPES
// =============================================================================

/// Which side of the resolve fast path a message uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Raw string payload, used for window acks.
    Internal,
    /// `base64(json(value))` payload.
    External,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Internal => "internal",
            Scope::External => "external",
        }
    }

    pub fn parse(tag: &str) -> Result<Self, CodecError> {
        match tag {
            "internal" => Ok(Scope::Internal),
            "external" => Ok(Scope::External),
            other => Err(CodecError::UnexpectedTag(other.to_string())),
        }
    }
}

/// Arguments of an Invoke.
#[derive(Debug, Clone, PartialEq)]
pub enum InvokePayload {
    Json(Value),
    /// Ordered `key:value` pairs of the `contextMenu` fast path.
    Pairs(Vec<(String, String)>),
}

impl InvokePayload {
    /// View the payload as JSON. Pairs become an object.
    pub fn to_value(&self) -> Value {
        match self {
            InvokePayload::Json(value) => value.clone(),
            InvokePayload::Pairs(pairs) => Value::Object(
                pairs
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
        }
    }

    /// View the payload as pairs. Only JSON objects qualify.
    pub fn to_pairs(&self) -> Result<Vec<(String, String)>, CodecError> {
        match self {
            InvokePayload::Pairs(pairs) => Ok(pairs.clone()),
            InvokePayload::Json(Value::Object(map)) => Ok(map
                .iter()
                .map(|(k, v)| (k.clone(), pair_value(v)))
                .collect()),
            InvokePayload::Json(other) => Err(CodecError::Json(format!(
                "contextMenu arguments must be an object, got {other}"
            ))),
        }
    }
}

/// Mirrors `String(value)` in script: strings unquoted, null empty.
fn pair_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Hosted script -> native call.
#[derive(Debug, Clone, PartialEq)]
pub struct Invoke {
    pub sequence: Sequence,
    pub name: String,
    pub payload: InvokePayload,
}

/// Native -> hosted script settlement of one pending call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolve {
    pub sequence: Sequence,
    /// `0` settles successfully, anything else rejects.
    pub status: i32,
    /// JSON text for external resolutions, raw text for internal ones.
    pub payload: String,
    pub internal: bool,
}

impl Resolve {
    pub fn scope(&self) -> Scope {
        if self.internal {
            Scope::Internal
        } else {
            Scope::External
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 0
    }
}

/// Native -> hosted script broadcast, not tied to a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMessage {
    pub name: String,
    /// JSON text of the event detail, if any.
    pub detail: Option<String>,
}

/// Native -> hosted script menu click.
///
/// With a positive sequence it settles that pending call, otherwise it is
/// broadcast as a `menuItemSelected` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuSelection {
    pub sequence: Option<Sequence>,
    pub title: String,
    pub parent: String,
    pub state: String,
}

impl MenuSelection {
    /// The sequence to settle, if any. Zero counts as none.
    pub fn settles(&self) -> Option<Sequence> {
        self.sequence.filter(|seq| *seq > 0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControlMessage {
    Invoke(Invoke),
    Resolve(Resolve),
    Event(EventMessage),
    MenuSelection(MenuSelection),
}

impl ControlMessage {
    /// Parse a framed wire string into its variant.
    pub fn decode(raw: &str) -> Result<Self, CodecError> {
        let tag = raw.split(';').next().unwrap_or_default();
        if tag == INVOKE_TAG {
            decode_invoke(raw).map(ControlMessage::Invoke)
        } else {
            decode_resolve(raw).map(ControlMessage::Resolve)
        }
    }

    /// The framed wire string. Events and menu selections have none.
    pub fn encode(&self) -> Result<Option<String>, CodecError> {
        match self {
            ControlMessage::Invoke(invoke) => {
                encode_invoke(invoke.sequence, &invoke.name, &invoke.payload).map(Some)
            }
            ControlMessage::Resolve(resolve) => Ok(Some(encode_resolve(resolve))),
            ControlMessage::Event(_) | ControlMessage::MenuSelection(_) => Ok(None),
        }
    }

    pub fn sequence(&self) -> Option<Sequence> {
        match self {
            ControlMessage::Invoke(m) => Some(m.sequence),
            ControlMessage::Resolve(m) => Some(m.sequence),
            ControlMessage::Event(_) => None,
            ControlMessage::MenuSelection(m) => m.settles(),
        }
    }
}

// =============================================================================
// PAYLOAD HELPERS
// =============================================================================

/// `base64(text)`, as `btoa` over the UTF-8 bytes.
pub fn encode_text(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Inverse of [`encode_text`].
pub fn decode_text(encoded: &str) -> Result<String, CodecError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| CodecError::Base64(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CodecError::Base64(e.to_string()))
}

/// `base64(json(value))`.
pub fn encode_json(value: &Value) -> Result<String, CodecError> {
    let text = serde_json::to_string(value).map_err(|e| CodecError::Json(e.to_string()))?;
    Ok(encode_text(&text))
}

/// `JSON.parse(atob(encoded))`.
pub fn decode_json(encoded: &str) -> Result<Value, CodecError> {
    let text = decode_text(encoded)?;
    serde_json::from_str(&text).map_err(|e| CodecError::Json(e.to_string()))
}

/// Join pairs as `k1:v1_k2:v2`.
pub fn flatten_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{k}:{v}"))
        .collect::<Vec<_>>()
        .join("_")
}

/// Split `k1:v1_k2:v2` back into ordered pairs. An item without `:` gets
/// an empty value.
pub fn parse_pairs(flat: &str) -> Vec<(String, String)> {
    if flat.is_empty() {
        return Vec::new();
    }
    flat.split('_')
        .map(|item| match item.split_once(':') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (item.to_string(), String::new()),
        })
        .collect()
}

// =============================================================================
// FRAMING
// =============================================================================

/// Split into exactly four fields. The last field keeps any further `;`.
fn split_fields(raw: &str) -> Result<[&str; FIELD_COUNT], CodecError> {
    let mut parts = raw.splitn(FIELD_COUNT, ';');
    let mut fields = [""; FIELD_COUNT];
    for (i, slot) in fields.iter_mut().enumerate() {
        *slot = parts.next().ok_or(CodecError::Malformed {
            expected: FIELD_COUNT,
            found: i,
        })?;
    }
    Ok(fields)
}

fn parse_sequence(field: &str) -> Result<Sequence, CodecError> {
    field
        .trim()
        .parse()
        .map_err(|_| CodecError::InvalidSequence(field.to_string()))
}

/// A binding name must not contain the field separator, or its Invoke
/// could never be split back into four fields.
pub fn check_binding_name(name: &str) -> Result<(), CodecError> {
    if name.contains(';') {
        return Err(CodecError::InvalidName(name.to_string()));
    }
    Ok(())
}

pub fn encode_invoke(
    sequence: Sequence,
    name: &str,
    payload: &InvokePayload,
) -> Result<String, CodecError> {
    check_binding_name(name)?;
    let encoded = if name == CONTEXT_MENU_BINDING {
        flatten_pairs(&payload.to_pairs()?)
    } else {
        encode_json(&payload.to_value())?
    };
    Ok(format!("{INVOKE_TAG};{sequence};{name};{encoded}"))
}

pub fn decode_invoke(raw: &str) -> Result<Invoke, CodecError> {
    let [tag, seq, name, payload] = split_fields(raw)?;
    if tag != INVOKE_TAG {
        return Err(CodecError::UnexpectedTag(tag.to_string()));
    }
    let sequence = parse_sequence(seq)?;

    let payload = if name == CONTEXT_MENU_BINDING {
        InvokePayload::Pairs(parse_pairs(payload))
    } else if payload.is_empty() {
        InvokePayload::Json(Value::Null)
    } else {
        InvokePayload::Json(decode_json(payload)?)
    };

    Ok(Invoke {
        sequence,
        name: name.to_string(),
        payload,
    })
}

pub fn encode_resolve(resolve: &Resolve) -> String {
    let payload = if resolve.internal {
        resolve.payload.clone()
    } else {
        encode_text(&resolve.payload)
    };
    format!(
        "{};{};{};{}",
        resolve.scope().as_str(),
        resolve.status,
        resolve.sequence,
        payload
    )
}

/// Header fields of a Resolve, with the payload left undecoded so a
/// receiver can still identify the call when the payload is bad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveFrame<'a> {
    pub scope: Scope,
    pub status: i32,
    pub sequence: Sequence,
    pub payload: &'a str,
}

pub fn split_resolve(raw: &str) -> Result<ResolveFrame<'_>, CodecError> {
    let [scope, status, seq, payload] = split_fields(raw.trim())?;
    let scope = Scope::parse(scope)?;
    let status = status
        .trim()
        .parse()
        .map_err(|_| CodecError::InvalidStatus(status.to_string()))?;
    let sequence = parse_sequence(seq)?;
    Ok(ResolveFrame {
        scope,
        status,
        sequence,
        payload,
    })
}

pub fn decode_resolve(raw: &str) -> Result<Resolve, CodecError> {
    let frame = split_resolve(raw)?;
    let payload = match frame.scope {
        Scope::Internal => frame.payload.to_string(),
        Scope::External => {
            let text = decode_text(frame.payload)?;
            serde_json::from_str::<Value>(&text).map_err(|e| CodecError::Json(e.to_string()))?;
            text
        }
    };
    Ok(Resolve {
        sequence: frame.sequence,
        status: frame.status,
        payload,
        internal: frame.scope == Scope::Internal,
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests;
