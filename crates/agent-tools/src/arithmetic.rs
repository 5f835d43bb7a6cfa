//! Integer addition

use agent_core::{ArgField, FnTool, Param, Result, Tool, ToolArgs};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct AddArgs {
    pub a: i64,
    pub b: i64,
}

impl ToolArgs for AddArgs {
    const FIELDS: &'static [ArgField] = &[ArgField::new("a"), ArgField::new("b")];
}

async fn add(args: AddArgs) -> anyhow::Result<String> {
    let sum = args
        .a
        .checked_add(args.b)
        .ok_or_else(|| anyhow::anyhow!("{} + {} overflows", args.a, args.b))?;
    tracing::debug!(a = args.a, b = args.b, sum, "add_numbers");
    Ok(sum.to_string())
}

/// `add_numbers {a, b}`
pub fn add_numbers() -> Result<impl Tool> {
    FnTool::new(
        "add_numbers",
        "Adds two integers and returns the sum",
        vec![
            Param::integer("a", "First number").required(),
            Param::integer("b", "Second number").required(),
        ],
        add,
    )
}
