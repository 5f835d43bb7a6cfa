//! Random integer in a closed range

use agent_core::{ArgField, FnTool, Param, Result, Tool, ToolArgs};
use rand::Rng;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct RandomArgs {
    pub min: i64,
    pub max: i64,
}

impl ToolArgs for RandomArgs {
    const FIELDS: &'static [ArgField] = &[ArgField::new("min"), ArgField::new("max")];
}

async fn pick(args: RandomArgs) -> anyhow::Result<String> {
    anyhow::ensure!(args.min <= args.max, "min cannot be greater than max");
    let n = rand::thread_rng().gen_range(args.min..=args.max);
    Ok(n.to_string())
}

/// `random_number {min, max}`
pub fn random_number() -> Result<impl Tool> {
    FnTool::new(
        "random_number",
        "Generates a random integer between min and max, inclusive",
        vec![
            Param::integer("min", "Lower bound").required(),
            Param::integer("max", "Upper bound").required(),
        ],
        pick,
    )
}
