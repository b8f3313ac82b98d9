use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const TOOLS_CALL: &str = "tools/call";
pub const SEARCH_CATALOG_TOOL: &str = "search_shop_catalog";
pub const CONTEXT_FIELD: &str = "context";
pub const DEFAULT_CONTEXT: &str = "default";

pub const PARSE_ERROR: i64 = -32700;
pub const PROXY_ERROR: i64 = -32000;

/// Inbound JSON-RPC payload, kept exactly as parsed. A single envelope or a
/// batch; only `id`, `method` and `params` are ever looked at, and nothing
/// is required of them.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct McpRequest(Value);

impl From<Value> for McpRequest {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl McpRequest {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// `method`, when this is a single envelope carrying a string method.
    pub fn method(&self) -> Option<&str> {
        self.0.get("method").and_then(Value::as_str)
    }

    /// Id to answer with when the relay has to synthesize a reply.
    pub fn response_id(&self) -> Value {
        match self.0.get("id") {
            None | Some(Value::Null) => Value::from(0),
            Some(id) => id.clone(),
        }
    }

    /// Fills in `params.arguments.context` for catalog searches that omit it.
    /// Returns whether the payload was changed.
    pub fn apply_default_context(&mut self) -> bool {
        if self.method() != Some(TOOLS_CALL) {
            return false;
        }
        let Some(Value::Object(params)) = self.0.get_mut("params") else {
            return false;
        };
        if params.get("name").and_then(Value::as_str) != Some(SEARCH_CATALOG_TOOL) {
            return false;
        }

        let arguments = params
            .entry("arguments")
            .or_insert_with(|| Value::Object(Map::new()));
        if arguments.is_null() {
            *arguments = Value::Object(Map::new());
        }
        let Value::Object(arguments) = arguments else {
            return false;
        };

        let has_context = match arguments.get(CONTEXT_FIELD) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        };
        if has_context {
            return false;
        }
        arguments.insert(CONTEXT_FIELD.into(), Value::from(DEFAULT_CONTEXT));
        true
    }
}

#[derive(Serialize, Debug)]
pub struct McpErrorResponse {
    pub jsonrpc: String,
    pub id: Value,
    pub error: McpError,
}

#[derive(Serialize, Debug)]
pub struct McpError {
    pub code: i64,
    pub message: String,
    pub data: String,
}

impl McpErrorResponse {
    pub fn new(id: Value, code: i64, message: &str, data: String) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            error: McpError {
                code,
                message: message.into(),
                data,
            },
        }
    }
}

/// One element of `result.content` in an upstream reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    /// `{"type":"text","text":...}`; `raw` keeps the block exactly as received.
    /// A scalar `text` is held as its JSON spelling.
    Text { text: String, raw: Value },
    Json { json: Value },
    /// Any other kind, or a block we cannot make sense of. Carried verbatim.
    Other(Value),
}

impl From<Value> for ContentBlock {
    fn from(raw: Value) -> Self {
        let is_text = raw.get("type").and_then(Value::as_str) == Some("text");
        // Scalars are read through their JSON spelling, so `42` parses as 42.
        let text = match raw.get("text") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(scalar @ (Value::Number(_) | Value::Bool(_) | Value::Null)) => Some(scalar.to_string()),
            _ => None,
        }
        .filter(|_| is_text);
        match text {
            Some(text) => Self::Text { text, raw },
            None => Self::Other(raw),
        }
    }
}

impl From<ContentBlock> for Value {
    fn from(block: ContentBlock) -> Self {
        match block {
            ContentBlock::Text { raw, .. } => raw,
            ContentBlock::Json { json } => serde_json::json!({ "type": "json", "json": json }),
            ContentBlock::Other(raw) => raw,
        }
    }
}

impl ContentBlock {
    /// Re-types a text block whose payload is itself JSON. Everything else,
    /// including text that does not parse, comes back untouched.
    pub fn into_structured(self) -> Self {
        match self {
            Self::Text { text, raw } => match serde_json::from_str::<Value>(&text) {
                Ok(json) => Self::Json { json },
                Err(_) => Self::Text { text, raw },
            },
            other => other,
        }
    }
}

/// Rewrites `result.content` in an upstream reply, if it is a list.
/// Returns how many blocks were re-typed.
pub fn reshape_result_content(response: &mut Value) -> usize {
    let Some(Value::Array(blocks)) = response.pointer_mut("/result/content") else {
        return 0;
    };

    let mut converted = 0;
    let reshaped: Vec<Value> = std::mem::take(blocks)
        .into_iter()
        .map(|raw| {
            let block = ContentBlock::from(raw).into_structured();
            if matches!(block, ContentBlock::Json { .. }) {
                converted += 1;
            }
            Value::from(block)
        })
        .collect();
    *blocks = reshaped;
    converted
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(v: Value) -> McpRequest {
        McpRequest::from(v)
    }

    #[test]
    fn injects_default_context_for_catalog_search() {
        let mut req = request(json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "tools/call",
            "params": { "name": "search_shop_catalog", "arguments": { "query": "shoes" } }
        }));
        assert!(req.apply_default_context());

        assert_eq!(
            req.into_value(),
            json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "tools/call",
                "params": {
                    "name": "search_shop_catalog",
                    "arguments": { "query": "shoes", "context": "default" }
                }
            })
        );
    }

    #[test]
    fn keeps_existing_context() {
        let mut req = request(json!({
            "method": "tools/call",
            "params": { "name": "search_shop_catalog", "arguments": { "context": "mens" } }
        }));
        let before = req.clone();
        assert!(!req.apply_default_context());
        assert_eq!(req, before);
    }

    #[test]
    fn empty_or_null_context_counts_as_missing() {
        for ctx in [json!(""), Value::Null] {
            let mut req = request(json!({
                "method": "tools/call",
                "params": { "name": "search_shop_catalog", "arguments": { "context": ctx } }
            }));
            assert!(req.apply_default_context());
            assert_eq!(
                req.as_value()["params"]["arguments"]["context"],
                json!("default")
            );
        }
    }

    #[test]
    fn creates_arguments_when_absent() {
        let mut req = request(json!({
            "method": "tools/call",
            "params": { "name": "search_shop_catalog" }
        }));
        assert!(req.apply_default_context());
        assert_eq!(
            req.as_value()["params"]["arguments"],
            json!({ "context": "default" })
        );
    }

    #[test]
    fn other_tools_and_methods_are_left_alone() {
        let cases = [
            json!({ "method": "tools/call", "params": { "name": "get_cart", "arguments": {} } }),
            json!({ "method": "tools/list", "params": { "name": "search_shop_catalog" } }),
            json!({ "method": "tools/call", "params": { "name": "search_shop_catalog", "arguments": [1] } }),
            json!({ "id": 1 }),
            json!({ "method": 5, "params": { "name": "search_shop_catalog" } }),
            json!({ "method": "tools/call", "params": ["search_shop_catalog"] }),
            json!([{ "method": "tools/call", "params": { "name": "search_shop_catalog" } }]),
        ];
        for case in cases {
            let mut req = request(case);
            let before = req.clone();
            assert!(!req.apply_default_context());
            assert_eq!(req, before);
        }
    }

    #[test]
    fn response_id_falls_back_to_zero() {
        assert_eq!(request(json!({ "id": "abc" })).response_id(), json!("abc"));
        assert_eq!(request(json!({})).response_id(), json!(0));
        assert_eq!(request(json!({ "id": null })).response_id(), json!(0));
        assert_eq!(request(json!([{ "id": 4 }])).response_id(), json!(0));
    }

    #[test]
    fn amendment_touches_nothing_but_context() {
        let mut req = request(json!({
            "jsonrpc": "2.0",
            "id": null,
            "method": "tools/call",
            "params": { "name": "search_shop_catalog", "arguments": {}, "_meta": { "t": 1 } },
            "x-trace": ["a", null]
        }));
        assert_eq!(req.method(), Some("tools/call"));
        assert!(req.apply_default_context());
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"jsonrpc":"2.0","id":null,"method":"tools/call","params":{"name":"search_shop_catalog","arguments":{"context":"default"},"_meta":{"t":1}},"x-trace":["a",null]}"#
        );
    }

    #[test]
    fn reshapes_json_text_blocks_in_order() {
        let mut resp = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "content": [
                    { "type": "text", "text": "hello" },
                    { "type": "text", "text": "{\"a\":1}" },
                    { "type": "image", "data": "xyz", "mimeType": "image/png" },
                    { "type": "text", "text": "[1,2]", "annotations": { "priority": 1 } }
                ],
                "isError": false
            }
        });
        assert_eq!(reshape_result_content(&mut resp), 2);
        assert_eq!(
            resp["result"],
            json!({
                "content": [
                    { "type": "text", "text": "hello" },
                    { "type": "json", "json": { "a": 1 } },
                    { "type": "image", "data": "xyz", "mimeType": "image/png" },
                    { "type": "json", "json": [1, 2] }
                ],
                "isError": false
            })
        );
    }

    #[test]
    fn scalar_text_is_read_as_json() {
        let mut resp = json!({ "result": { "content": [
            { "type": "text", "text": 42 },
            { "type": "text", "text": true },
            { "type": "text", "text": null }
        ] } });
        assert_eq!(reshape_result_content(&mut resp), 3);
        assert_eq!(
            resp["result"]["content"],
            json!([
                { "type": "json", "json": 42 },
                { "type": "json", "json": true },
                { "type": "json", "json": null }
            ])
        );
    }

    #[test]
    fn malformed_blocks_pass_through() {
        let blocks = json!([
            { "type": "text" },
            { "type": "text", "text": { "nested": 1 } },
            { "type": "text", "text": [5] },
            { "type": "json", "json": { "already": true } },
            "not even an object"
        ]);
        let mut resp = json!({ "result": { "content": blocks.clone() } });
        assert_eq!(reshape_result_content(&mut resp), 0);
        assert_eq!(resp["result"]["content"], blocks);
    }

    #[test]
    fn responses_without_content_list_are_untouched() {
        for original in [
            json!({ "error": { "code": -1, "message": "nope" } }),
            json!({ "result": { "tools": [] } }),
            json!({ "result": { "content": "text" } }),
            json!([1, 2, 3]),
        ] {
            let mut resp = original.clone();
            assert_eq!(reshape_result_content(&mut resp), 0);
            assert_eq!(resp, original);
        }
    }

    #[test]
    fn error_envelope_shape() {
        let body = McpErrorResponse::new(json!(3), PROXY_ERROR, "Proxy Error", "boom".into());
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "id": 3,
                "error": { "code": -32000, "message": "Proxy Error", "data": "boom" }
            })
        );
    }
}
