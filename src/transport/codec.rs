//! Engine.IO v4 / Socket.IO v5 text packet codec
//!
//! Only the default namespace and text (non-binary) packets are supported.
//!
//! ```text
//! 0{"sid":"..","pingInterval":25000,"pingTimeout":20000}   engine open
//! 2 / 3                                                    ping / pong
//! 40{"token":".."}                                         namespace connect
//! 42["companyMessage",{"type":"new customer add",..}]      event
//! ```

use serde::Deserialize;
use serde_json::Value;

use crate::error::{NotifyError, NotifyResult};

/// Engine.IO protocol revision sent in the endpoint query
pub const ENGINE_IO_VERSION: u8 = 4;

/// Engine.IO open handshake
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
}

/// Engine.IO packet
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping(String),
    Pong(String),
    Message(SocketPacket),
    Upgrade,
    Noop,
}

/// Socket.IO packet carried inside an Engine.IO message
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect(Option<Value>),
    Disconnect,
    Event {
        name: String,
        args: Vec<Value>,
        ack_id: Option<u64>,
    },
    Ack {
        ack_id: u64,
        args: Vec<Value>,
    },
    ConnectError(Value),
}

fn codec_err(msg: impl Into<String>) -> NotifyError {
    NotifyError::Codec(msg.into())
}

/// Decode one websocket text frame
pub fn decode(text: &str) -> NotifyResult<EnginePacket> {
    let kind = text.chars().next().ok_or_else(|| codec_err("empty packet"))?;
    let rest = &text[kind.len_utf8()..];

    match kind {
        '0' => {
            let handshake = serde_json::from_str(rest)
                .map_err(|e| codec_err(format!("bad open handshake: {}", e)))?;
            Ok(EnginePacket::Open(handshake))
        }
        '1' => Ok(EnginePacket::Close),
        '2' => Ok(EnginePacket::Ping(rest.to_string())),
        '3' => Ok(EnginePacket::Pong(rest.to_string())),
        '4' => Ok(EnginePacket::Message(decode_socket(rest)?)),
        '5' => Ok(EnginePacket::Upgrade),
        '6' => Ok(EnginePacket::Noop),
        other => Err(codec_err(format!("unknown engine packet type {:?}", other))),
    }
}

fn decode_socket(text: &str) -> NotifyResult<SocketPacket> {
    let kind = text
        .chars()
        .next()
        .ok_or_else(|| codec_err("empty socket packet"))?;
    let mut rest = &text[kind.len_utf8()..];

    // "/admin,..." namespace prefix; only "/" is used here so it is skipped
    if rest.starts_with('/') {
        rest = match rest.find(',') {
            Some(i) => &rest[i + 1..],
            None => "",
        };
    }

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    let ack_id = if digits > 0 {
        Some(
            rest[..digits]
                .parse::<u64>()
                .map_err(|e| codec_err(format!("bad ack id: {}", e)))?,
        )
    } else {
        None
    };
    rest = &rest[digits..];

    match kind {
        '0' => {
            if rest.is_empty() {
                Ok(SocketPacket::Connect(None))
            } else {
                Ok(SocketPacket::Connect(Some(parse_json(rest)?)))
            }
        }
        '1' => Ok(SocketPacket::Disconnect),
        '2' => {
            let mut args = parse_array(rest)?;
            if args.is_empty() {
                return Err(codec_err("event packet without a name"));
            }
            let name = match args.remove(0) {
                Value::String(name) => name,
                other => return Err(codec_err(format!("event name is not a string: {}", other))),
            };
            Ok(SocketPacket::Event { name, args, ack_id })
        }
        '3' => {
            let ack_id = ack_id.ok_or_else(|| codec_err("ack packet without id"))?;
            Ok(SocketPacket::Ack {
                ack_id,
                args: parse_array(rest)?,
            })
        }
        '4' => Ok(SocketPacket::ConnectError(
            serde_json::from_str(rest).unwrap_or_else(|_| Value::String(rest.to_string())),
        )),
        '5' | '6' => Err(codec_err("binary packets are not supported")),
        other => Err(codec_err(format!("unknown socket packet type {:?}", other))),
    }
}

fn parse_json(text: &str) -> NotifyResult<Value> {
    serde_json::from_str(text).map_err(|e| codec_err(format!("bad packet data: {}", e)))
}

fn parse_array(text: &str) -> NotifyResult<Vec<Value>> {
    match parse_json(text)? {
        Value::Array(items) => Ok(items),
        other => Err(codec_err(format!("expected array, got {}", other))),
    }
}

/// `42["name",payload]`
pub fn encode_event(name: &str, payload: &Value) -> String {
    let frame = Value::Array(vec![Value::String(name.to_string()), payload.clone()]);
    format!("42{}", frame)
}

/// Namespace connect, optionally with an auth object
pub fn encode_connect(auth: Option<&Value>) -> String {
    match auth {
        Some(auth) => format!("40{}", auth),
        None => "40".to_string(),
    }
}

pub fn encode_disconnect() -> String {
    "41".to_string()
}

/// Reply to an engine ping, echoing its data
pub fn encode_pong(data: &str) -> String {
    format!("3{}", data)
}

/// Server-side open packet, used by test servers
pub fn encode_open(sid: &str, ping_interval: u64, ping_timeout: u64) -> String {
    format!(
        "0{}",
        serde_json::json!({
            "sid": sid,
            "upgrades": [],
            "pingInterval": ping_interval,
            "pingTimeout": ping_timeout,
        })
    )
}

/// Websocket endpoint for a socket server base URL
///
/// `http(s)://host` becomes `ws(s)://host/socket.io/?EIO=4&transport=websocket`.
pub fn endpoint_url(base: &str, token: Option<&str>) -> NotifyResult<String> {
    let base = base.trim().trim_end_matches('/');
    let rest_of = |prefix: &str| base.strip_prefix(prefix).map(str::to_string);

    let ws_base = if let Some(rest) = rest_of("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = rest_of("http://") {
        format!("ws://{}", rest)
    } else if base.starts_with("ws://") || base.starts_with("wss://") {
        base.to_string()
    } else {
        return Err(NotifyError::Config(format!(
            "socket url must start with http(s):// or ws(s)://, got {:?}",
            base
        )));
    };

    let mut url = format!(
        "{}/socket.io/?EIO={}&transport=websocket",
        ws_base, ENGINE_IO_VERSION
    );
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        url.push_str("&token=");
        url.push_str(&urlencoding::encode(token));
    }
    Ok(url)
}
