use serde::Serialize;
use serde_json::Value;
use tracing::error;

use super::normalize::Normalized;
use super::outgoing::OutgoingResponse;
use super::xml::to_xml;
use crate::request::MultiMap;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const XML_CONTENT_TYPE: &str = "application/xml";

/// Canonical response tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub error: Option<String>,
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<Value>,
}

impl Envelope {
    #[must_use]
    pub fn new(normalized: &Normalized, debug: Option<Value>) -> Self {
        Self {
            success: normalized.error.is_none(),
            message: normalized.message.clone(),
            error: normalized.error.clone(),
            data: normalized.data.envelope_data(),
            debug,
        }
    }

    /// Top-level fields in envelope order.
    fn ordered_fields(&self) -> Vec<(&'static str, Value)> {
        let mut fields = vec![("success", Value::Bool(self.success))];
        if let Some(message) = &self.message {
            fields.push(("message", Value::String(message.clone())));
        }
        fields.push((
            "error",
            self.error.clone().map_or(Value::Null, Value::String),
        ));
        fields.push(("data", self.data.clone()));
        if let Some(debug) = &self.debug {
            fields.push(("debug", debug.clone()));
        }
        fields
    }

    #[must_use]
    pub fn to_json(&self, minify: bool) -> Vec<u8> {
        let rendered = if minify {
            serde_json::to_vec(self)
        } else {
            serde_json::to_vec_pretty(self)
        };
        rendered.unwrap_or_else(|e| {
            error!(error = %e, "Failed to serialize response envelope");
            br#"{"success":false,"error":"SERVER_ERROR","data":{}}"#.to_vec()
        })
    }

    #[must_use]
    pub fn to_xml(&self, minify: bool) -> Vec<u8> {
        let fields = self.ordered_fields();
        let refs: Vec<(&str, &Value)> = fields.iter().map(|(k, v)| (*k, v)).collect();
        to_xml(&refs, minify).unwrap_or_else(|e| {
            error!(error = %e, "Failed to serialize response envelope");
            br#"<?xml version="1.0" encoding="UTF-8"?><nasse><success>false</success><error>SERVER_ERROR</error><data></data></nasse>"#.to_vec()
        })
    }
}

/// Envelope serialization format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Json,
    Xml,
}

/// Client hints read from the query string: `format=xml|json`,
/// `minify=1|0`, and the presence of `call_stack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatHints {
    pub format: Format,
    /// Compact output. Defaults to `true` outside debug mode.
    pub minify: bool,
    pub call_stack: bool,
}

fn truthy(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl FormatHints {
    #[must_use]
    pub fn defaults(debug: bool) -> Self {
        Self {
            format: Format::Json,
            minify: !debug,
            call_stack: false,
        }
    }

    #[must_use]
    pub fn from_args(args: &MultiMap, debug: bool) -> Self {
        let mut hints = Self::defaults(debug);
        if let Some(format) = args.get_str("format") {
            hints.format = if format.trim().eq_ignore_ascii_case("xml") {
                Format::Xml
            } else {
                Format::Json
            };
        }
        if let Some(minify) = args.get_str("minify").and_then(truthy) {
            hints.minify = minify;
        }
        hints.call_stack = args.contains_key("call_stack");
        hints
    }
}

/// Render a normalized result for the transport.
///
/// With `json` set the envelope is used (JSON or XML per the hints);
/// otherwise the data is sent as is.
#[must_use]
pub fn render(
    normalized: Normalized,
    hints: &FormatHints,
    json: bool,
    debug: Option<Value>,
) -> OutgoingResponse {
    let (body, content_type) = if json {
        let envelope = Envelope::new(&normalized, debug);
        match hints.format {
            Format::Json => (envelope.to_json(hints.minify), JSON_CONTENT_TYPE.to_string()),
            Format::Xml => (envelope.to_xml(hints.minify), XML_CONTENT_TYPE.to_string()),
        }
    } else {
        let (body, default_type) = normalized.data.into_raw();
        let content_type = normalized
            .content_type
            .clone()
            .unwrap_or_else(|| default_type.to_string());
        (body, content_type)
    };

    let mut response = OutgoingResponse::new(normalized.code, body);
    response.set_header("content-type", content_type);
    for (name, value) in normalized.headers {
        response.set_header(&name, value);
    }
    for cookie in &normalized.cookies {
        response.append_header("set-cookie", cookie.to_header_value());
    }
    response
}
