use async_trait::async_trait;
use graphql_functions_config::graphiql::ExplorerOptions;
use serde::Serialize;
use serde_json::Value;

use crate::{
    context::{QueryParams, RequestContext},
    error::BoxError,
    explorer::ExplorerRenderer,
};

static GRAPHIQL_HTML: &str = include_str!("../../static/graphiql.html");

pub const GRAPHIQL_VERSION: &str = "0.11.11";
const SUBSCRIPTIONS_TRANSPORT_VERSION: &str = "0.9.18";
const CODEMIRROR_VERSION: &str = "5.65.16";

#[derive(Debug, thiserror::Error)]
pub enum GraphiQLRenderError {
    #[error("Variables are invalid JSON.")]
    InvalidVariables(#[source] serde_json::Error),
    #[error("Failed to serialize GraphiQL page data: {0}")]
    Serialization(#[from] sonic_rs::Error),
}

/// Page state after merging the request query string over the configured defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphiQLData<'a> {
    pub endpoint_url: &'a str,
    pub subscriptions_endpoint: Option<&'a str>,
    pub query: Option<&'a str>,
    pub variables: Option<Value>,
    pub operation_name: Option<&'a str>,
    pub result: Option<&'a Value>,
    pub pass_header: Option<&'a str>,
    pub editor_theme: Option<&'a str>,
    pub websocket_connection_params: Option<&'a Value>,
    pub rewrite_url: bool,
}

pub fn resolve_graphiql_data<'a>(
    query: &'a QueryParams,
    options: &'a ExplorerOptions,
) -> Result<GraphiQLData<'a>, GraphiQLRenderError> {
    let param = |key: &str| query.get_str(key).filter(|value| !value.is_empty());

    let variables = match param("variables") {
        Some(raw) => Some(serde_json::from_str(raw).map_err(GraphiQLRenderError::InvalidVariables)?),
        None => options.variables.clone(),
    };

    Ok(GraphiQLData {
        endpoint_url: &options.endpoint_url,
        subscriptions_endpoint: options.subscriptions_endpoint.as_deref(),
        query: param("query").or(options.query.as_deref()),
        variables,
        operation_name: param("operationName").or(options.operation_name.as_deref()),
        result: options.result.as_ref(),
        pass_header: options.pass_header.as_deref(),
        editor_theme: options.editor_theme.as_deref(),
        websocket_connection_params: options.websocket_connection_params.as_ref(),
        rewrite_url: options.rewrite_url,
    })
}

/// JSON for embedding inside a `<script>` block. `/` is escaped so a value can never
/// close the surrounding tag.
fn safe_serialize<T: Serialize + ?Sized>(value: Option<&T>) -> Result<String, sonic_rs::Error> {
    match value {
        Some(value) => Ok(sonic_rs::to_string(value)?.replace('/', "\\/")),
        None => Ok("undefined".to_string()),
    }
}

fn pretty_json(value: Option<&Value>) -> Result<Option<String>, sonic_rs::Error> {
    value.map(sonic_rs::to_string_pretty).transpose()
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Replaces `{{NAME}}` markers in one pass, so substituted values are never expanded again.
fn fill_placeholders(template: &str, values: &[(&str, &str)]) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        let Some(end) = after_open.find("}}") else {
            output.push_str(&rest[start..]);
            rest = "";
            break;
        };

        let name = &after_open[..end];
        match values.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => output.push_str(value),
            None => output.push_str(&rest[start..start + end + 4]),
        }
        rest = &after_open[end + 2..];
    }

    output.push_str(rest);
    output
}

pub fn render_graphiql(data: &GraphiQLData<'_>) -> Result<String, GraphiQLRenderError> {
    let variables = pretty_json(data.variables.as_ref())?;
    let result = pretty_json(data.result)?;

    let editor_theme_link = match data.editor_theme {
        Some(theme) => format!(
            r#"<link href="//unpkg.com/codemirror@{}/theme/{}.css" rel="stylesheet" />"#,
            CODEMIRROR_VERSION,
            escape_attribute(theme)
        ),
        None => String::new(),
    };

    let subscriptions_scripts = match data.subscriptions_endpoint {
        Some(_) => format!(
            concat!(
                r#"<script src="//unpkg.com/subscriptions-transport-ws@{}/browser/client.js" type="application/javascript"></script>"#,
                r#"<script src="//unpkg.com/graphiql-subscriptions-fetcher@0.0.2/browser/client.js" type="application/javascript"></script>"#
            ),
            SUBSCRIPTIONS_TRANSPORT_VERSION
        ),
        None => String::new(),
    };

    let endpoint_url = safe_serialize(Some(data.endpoint_url))?;
    let subscriptions_endpoint = safe_serialize(data.subscriptions_endpoint)?;
    let websocket_connection_params = safe_serialize(data.websocket_connection_params)?;
    let query = safe_serialize(data.query)?;
    let variables = safe_serialize(variables.as_deref())?;
    let result = safe_serialize(result.as_deref())?;
    let operation_name = safe_serialize(data.operation_name)?;
    let editor_theme = safe_serialize(data.editor_theme)?;
    let rewrite_url = if data.rewrite_url { "true" } else { "false" };

    Ok(fill_placeholders(
        GRAPHIQL_HTML,
        &[
            ("GRAPHIQL_VERSION", GRAPHIQL_VERSION),
            ("EDITOR_THEME_LINK", &editor_theme_link),
            ("SUBSCRIPTIONS_SCRIPTS", &subscriptions_scripts),
            ("ENDPOINT_URL", &endpoint_url),
            ("PASS_HEADER", data.pass_header.unwrap_or_default()),
            ("SUBSCRIPTIONS_ENDPOINT", &subscriptions_endpoint),
            ("WEBSOCKET_CONNECTION_PARAMS", &websocket_connection_params),
            ("REWRITE_URL", rewrite_url),
            ("QUERY", &query),
            ("RESULT", &result),
            ("VARIABLES", &variables),
            ("OPERATION_NAME", &operation_name),
            ("EDITOR_THEME", &editor_theme),
        ],
    ))
}

/// Renders the classic GraphiQL page from `ExplorerOptions`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GraphiQLRenderer;

#[async_trait]
impl ExplorerRenderer for GraphiQLRenderer {
    type Options = ExplorerOptions;

    async fn render(
        &self,
        query: &QueryParams,
        options: &ExplorerOptions,
        _ctx: &dyn RequestContext,
    ) -> Result<String, BoxError> {
        let data = resolve_graphiql_data(query, options)?;
        Ok(render_graphiql(&data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FunctionContext;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        QueryParams::from_pairs(
            pairs
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string())),
        )
    }

    #[test]
    fn query_string_overrides_configured_defaults() {
        let options = ExplorerOptions {
            query: Some("{ fromOptions }".to_string()),
            operation_name: Some("FromOptions".to_string()),
            variables: Some(serde_json::json!({ "from": "options" })),
            ..Default::default()
        };
        let query = params(&[
            ("query", "{ fromQueryString }"),
            ("variables", r#"{"from":"query"}"#),
        ]);

        let data = resolve_graphiql_data(&query, &options).expect("data resolves");

        assert_eq!(data.query, Some("{ fromQueryString }"));
        assert_eq!(data.variables, Some(serde_json::json!({ "from": "query" })));
        assert_eq!(data.operation_name, Some("FromOptions"));
        assert_eq!(data.endpoint_url, "/graphql");
    }

    #[test]
    fn invalid_variables_fail_to_resolve() {
        let options = ExplorerOptions::default();
        let query = params(&[("variables", "{ nope")]);

        let error = resolve_graphiql_data(&query, &options).expect_err("variables are invalid");

        assert_eq!(error.to_string(), "Variables are invalid JSON.");
    }

    #[test]
    fn embedded_values_cannot_close_the_script_tag() {
        let options = ExplorerOptions::with_endpoint_url("/api/graphql");
        let query = params(&[("query", "{ me } </script><script>alert(1)</script>")]);

        let data = resolve_graphiql_data(&query, &options).expect("data resolves");
        let html = render_graphiql(&data).expect("page renders");

        assert!(html.contains(r#"locationQuery(otherParams, "\/api\/graphql")"#));
        assert!(html.contains(r#"query: "{ me } <\/script><script>alert(1)<\/script>""#));
        assert_eq!(html.matches("</script>").count(), 5);
    }

    #[test]
    fn missing_values_render_as_undefined() {
        let options = ExplorerOptions::default();
        let query = QueryParams::new();

        let data = resolve_graphiql_data(&query, &options).expect("data resolves");
        let html = render_graphiql(&data).expect("page renders");

        assert!(html.contains("query: undefined,"));
        assert!(html.contains("variables: undefined,"));
        assert!(html.contains("operationName: undefined,"));
        assert!(html.contains("var subscriptionsEndpoint = undefined;"));
        assert!(html.contains("var rewriteURL = true;"));
        assert!(!html.contains("subscriptions-transport-ws"));
        assert!(!html.contains("codemirror"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn renders_subscriptions_theme_and_headers() {
        let options = ExplorerOptions {
            subscriptions_endpoint: Some("wss://example.com/graphql".to_string()),
            websocket_connection_params: Some(serde_json::json!({ "token": "abc" })),
            editor_theme: Some("solarized".to_string()),
            pass_header: Some("'Authorization': localStorage['token'],".to_string()),
            rewrite_url: false,
            ..Default::default()
        };

        let query = QueryParams::new();
        let data = resolve_graphiql_data(&query, &options).expect("data resolves");
        let html = render_graphiql(&data).expect("page renders");

        assert!(html.contains(r#"var subscriptionsEndpoint = "wss:\/\/example.com\/graphql";"#));
        assert!(html.contains(r#"connectionParams: {"token":"abc"}"#));
        assert!(html.contains("subscriptions-transport-ws@"));
        assert!(html.contains("/theme/solarized.css"));
        assert!(html.contains(r#"editorTheme: "solarized""#));
        assert!(html.contains("'Authorization': localStorage['token'],"));
        assert!(html.contains("var rewriteURL = false;"));
    }

    #[test]
    fn variables_are_embedded_as_pretty_json_text() {
        let options = ExplorerOptions::default();
        let query = params(&[("variables", r#"{"id":"1"}"#)]);

        let data = resolve_graphiql_data(&query, &options).expect("data resolves");
        let html = render_graphiql(&data).expect("page renders");

        assert!(html.contains(r#"variables: "{\n  \"id\": \"1\"\n}","#));
    }

    #[test]
    fn placeholders_are_filled_in_a_single_pass() {
        let filled = fill_placeholders(
            "a={{A}} b={{B}} c={{C}}",
            &[("A", "{{B}}"), ("B", "2")],
        );

        assert_eq!(filled, "a={{B}} b=2 c={{C}}");
    }

    #[tokio::test]
    async fn renderer_uses_the_query_params() {
        let ctx = FunctionContext::builder().build();
        let html = GraphiQLRenderer
            .render(
                &params(&[("query", "{ hello }")]),
                &ExplorerOptions::default(),
                &ctx,
            )
            .await
            .expect("page renders");

        assert!(html.contains(r#"query: "{ hello }","#));
    }
}
