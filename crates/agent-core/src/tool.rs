//! Tool System
//!
//! Tools are built once, registered with the agent (for dispatch) and with the
//! model provider (for advertisement), and are read-only afterwards.

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AgentError, Result};
use crate::message::ToolCallRequest;
use crate::schema::{ArgField, Param, compile_schema, validate_params};

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool identifier
    fn name(&self) -> &str;

    /// Human-readable description (shown to LLM)
    fn description(&self) -> &str;

    /// Declared parameters, compiled into the advertised schema
    fn params(&self) -> &[Param];

    /// Execute the tool with raw JSON arguments
    async fn execute(&self, args: &Value) -> anyhow::Result<String>;
}

/// Argument struct of a typed tool.
///
/// `FIELDS` lists the struct's fields the way serde sees them, so declared
/// parameters can be checked against it when the tool is built:
///
/// ```rust,ignore
/// #[derive(Default, Deserialize)]
/// struct AddArgs { a: i64, b: i64 }
///
/// impl ToolArgs for AddArgs {
///     const FIELDS: &'static [ArgField] = &[ArgField::new("a"), ArgField::new("b")];
/// }
/// ```
pub trait ToolArgs: DeserializeOwned + Default + Send + 'static {
    const FIELDS: &'static [ArgField];
}

/// Arguments of a tool that takes none
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct NoArgs {}

impl ToolArgs for NoArgs {
    const FIELDS: &'static [ArgField] = &[];
}

/// Tool built from a typed async action
pub struct FnTool<A, F> {
    name: String,
    description: String,
    params: Vec<Param>,
    action: F,
    _args: PhantomData<fn(A)>,
}

impl<A, F, Fut> FnTool<A, F>
where
    A: ToolArgs,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
{
    /// Build a tool, failing when a declared parameter has no matching field in `A`.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        params: Vec<Param>,
        action: F,
    ) -> Result<Self> {
        let name = name.into();
        validate_params(&params, A::FIELDS, std::any::type_name::<A>()).map_err(|e| match e {
            AgentError::ToolValidation(msg) => {
                AgentError::ToolValidation(format!("tool '{name}': {msg}"))
            }
            other => other,
        })?;

        Ok(Self {
            name,
            description: description.into(),
            params,
            action,
            _args: PhantomData,
        })
    }
}

/// Decode arguments leniently: anything that does not fit the struct falls
/// back to its default value.
fn decode_args<A: ToolArgs>(tool: &str, args: &Value) -> A {
    match serde_json::from_value(args.clone()) {
        Ok(decoded) => decoded,
        Err(e) => {
            if !args.is_null() {
                tracing::warn!(tool, error = %e, "Tool arguments did not decode, using defaults");
            }
            A::default()
        }
    }
}

#[async_trait]
impl<A, F, Fut> Tool for FnTool<A, F>
where
    A: ToolArgs,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn params(&self) -> &[Param] {
        &self.params
    }

    async fn execute(&self, args: &Value) -> anyhow::Result<String> {
        let args = decode_args::<A>(&self.name, args);
        (self.action)(args).await
    }
}

/// Tool definition schema (for LLM function calling)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// Compiled object schema of the parameters
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn from_tool(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            parameters: compile_schema(tool.params()),
        }
    }
}

/// Registry for available tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<()> {
        self.register_arc(Arc::new(tool))
    }

    /// Register a shared tool. Names must be unique.
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(AgentError::Config(format!("Tool '{name}' registered twice")));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Execute a tool call
    pub async fn execute(&self, request: &ToolCallRequest) -> Result<String> {
        let name = &request.call.name;
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| AgentError::ToolNotFound(name.clone()))?;

        tool.execute(&request.args)
            .await
            .map_err(|e| AgentError::ToolExecution {
                name: name.clone(),
                message: format!("{e:#}"),
            })
    }

    /// Get tool names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize)]
    struct AddArgs {
        a: i64,
        b: i64,
    }

    impl ToolArgs for AddArgs {
        const FIELDS: &'static [ArgField] = &[ArgField::new("a"), ArgField::new("b")];
    }

    async fn add(args: AddArgs) -> anyhow::Result<String> {
        Ok((args.a + args.b).to_string())
    }

    async fn fail(_: NoArgs) -> anyhow::Result<String> {
        anyhow::bail!("disk on fire")
    }

    fn adder() -> impl Tool {
        FnTool::new(
            "add_numbers",
            "Adds two integers",
            vec![
                Param::integer("a", "First number").required(),
                Param::integer("b", "Second number").required(),
            ],
            add,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_typed_execute() {
        let tool = adder();
        assert_eq!(tool.execute(&json!({"a": 2, "b": 3})).await.unwrap(), "5");
    }

    #[tokio::test]
    async fn test_malformed_args_use_defaults() {
        let tool = adder();
        assert_eq!(tool.execute(&json!("not an object")).await.unwrap(), "0");
        assert_eq!(tool.execute(&Value::Null).await.unwrap(), "0");
    }

    #[test]
    fn test_param_mismatch_fails_construction() {
        let result = FnTool::new(
            "add_numbers",
            "Adds two integers",
            vec![Param::integer("first", "First number")],
            add,
        );
        let err = result.err().unwrap();
        let msg = err.to_string();
        assert!(msg.contains("\"first\""), "{msg}");
        assert!(msg.contains("AddArgs"), "{msg}");
        assert!(msg.contains("add_numbers"), "{msg}");
    }

    #[allow(non_snake_case)]
    #[derive(Debug, Default, Deserialize)]
    struct BareBounds {
        Min: i64,
    }

    impl ToolArgs for BareBounds {
        const FIELDS: &'static [ArgField] = &[ArgField::new("Min")];
    }

    #[allow(non_snake_case)]
    #[derive(Debug, Default, Deserialize)]
    struct Bounds {
        #[serde(rename = "min")]
        Min: i64,
    }

    impl ToolArgs for Bounds {
        const FIELDS: &'static [ArgField] = &[ArgField::renamed("Min", "min")];
    }

    #[tokio::test]
    async fn test_capitalized_field_needs_explicit_rename() {
        let bare = FnTool::new(
            "lower",
            "Echoes the lower bound",
            vec![Param::integer("min", "Lower bound")],
            |args: BareBounds| async move { Ok::<_, anyhow::Error>(args.Min.to_string()) },
        );
        assert!(matches!(bare, Err(AgentError::ToolValidation(_))));

        let renamed = FnTool::new(
            "lower",
            "Echoes the lower bound",
            vec![Param::integer("min", "Lower bound")],
            |args: Bounds| async move { Ok::<_, anyhow::Error>(args.Min.to_string()) },
        )
        .unwrap();
        assert_eq!(renamed.execute(&json!({"min": 7})).await.unwrap(), "7");
    }

    #[test]
    fn test_tool_registry() {
        let mut registry = ToolRegistry::new();
        registry.register(adder()).unwrap();
        registry
            .register(FnTool::new("fail", "Always fails", Vec::new(), fail).unwrap())
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["add_numbers", "fail"]);
        assert!(registry.get("unknown").is_none());

        let dup = registry.register(adder());
        assert!(matches!(dup, Err(AgentError::Config(_))));
    }

    #[test]
    fn test_definitions_carry_compiled_schema() {
        let mut registry = ToolRegistry::new();
        registry.register(adder()).unwrap();

        let def = ToolDefinition::from_tool(registry.get("add_numbers").unwrap().as_ref());
        assert_eq!(def.name, "add_numbers");
        assert_eq!(def.parameters["required"], json!(["a", "b"]));
        assert_eq!(def.parameters["properties"]["b"]["type"], "integer");
    }

    #[tokio::test]
    async fn test_registry_execute_errors() {
        let mut registry = ToolRegistry::new();
        registry
            .register(FnTool::new("fail", "Always fails", Vec::new(), fail).unwrap())
            .unwrap();

        let missing = ToolCallRequest::new("c1", "nope", json!({}));
        assert!(matches!(
            registry.execute(&missing).await,
            Err(AgentError::ToolNotFound(name)) if name == "nope"
        ));

        let failing = ToolCallRequest::new("c2", "fail", json!({}));
        match registry.execute(&failing).await {
            Err(AgentError::ToolExecution { name, message }) => {
                assert_eq!(name, "fail");
                assert_eq!(message, "disk on fire");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
