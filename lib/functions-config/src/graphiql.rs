use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Options of the GraphiQL exploration page.
///
/// Values coming from the request query string (`query`, `variables`, `operationName`)
/// take precedence over the defaults configured here.
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExplorerOptions {
    /// The GraphQL endpoint the page sends operations to.
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,

    /// WebSocket endpoint used for subscription operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscriptions_endpoint: Option<String>,

    /// Operation shown in the editor when the query string does not provide one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Variables shown in the editor when the query string does not provide them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,

    /// Operation name selected when the query string does not provide one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,

    /// A pre-computed result shown in the result pane on load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// A JavaScript snippet of extra `key: value` pairs merged into the fetch headers,
    /// for example `'Authorization': localStorage['token']`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_header: Option<String>,

    /// CodeMirror theme name of the editor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor_theme: Option<String>,

    /// Parameters sent with the WebSocket `connection_init` message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub websocket_connection_params: Option<Value>,

    /// Keeps the browser URL in sync with the editor state. Enabled by default.
    #[serde(default = "default_rewrite_url")]
    pub rewrite_url: bool,
}

fn default_endpoint_url() -> String {
    "/graphql".to_string()
}

fn default_rewrite_url() -> bool {
    true
}

impl Default for ExplorerOptions {
    fn default() -> Self {
        Self {
            endpoint_url: default_endpoint_url(),
            subscriptions_endpoint: None,
            query: None,
            variables: None,
            operation_name: None,
            result: None,
            pass_header: None,
            editor_theme: None,
            websocket_connection_params: None,
            rewrite_url: default_rewrite_url(),
        }
    }
}

impl ExplorerOptions {
    pub fn with_endpoint_url(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            ..Default::default()
        }
    }
}
