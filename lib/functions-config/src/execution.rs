use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Controls how the GraphQL engine treats the requests handed over by the query handler.
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ExecutionOptions {
    /// Allows introspection queries (`__schema`, `__type`). Enabled by default.
    #[serde(default = "default_true")]
    pub introspection: bool,

    /// Accepts a JSON array of operations in a single POST body. Enabled by default.
    #[serde(default = "default_true")]
    pub batching: bool,

    /// Upper bound on the number of operations accepted in one batch.
    /// Ignored when `batching` is disabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_batch_size: Option<usize>,
}

fn default_true() -> bool {
    true
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            introspection: true,
            batching: true,
            max_batch_size: None,
        }
    }
}
