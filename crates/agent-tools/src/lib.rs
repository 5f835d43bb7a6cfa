//! # agent-tools
//!
//! Small tools for trying the agent end to end:
//!
//! | Tool             | Arguments            | Result                       |
//! |------------------|----------------------|------------------------------|
//! | `add_numbers`    | `a`, `b` (integers)  | `a + b`                      |
//! | `random_number`  | `min`, `max`         | uniform integer in `[min, max]` |
//! | `time_reporter`  | none                 | current UTC time, RFC 3339   |

mod arithmetic;
mod clock;
mod random;

use std::sync::Arc;

use agent_core::{Result, Tool};

pub use arithmetic::{AddArgs, add_numbers};
pub use clock::time_reporter;
pub use random::{RandomArgs, random_number};

/// Build every demo tool, ready for `AgentBuilder::tools`.
pub fn all() -> Result<Vec<Arc<dyn Tool>>> {
    let tools: Vec<Arc<dyn Tool>> = vec![
        Arc::new(add_numbers()?),
        Arc::new(random_number()?),
        Arc::new(time_reporter()?),
    ];
    Ok(tools)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_tools_have_unique_names() {
        let tools = all().unwrap();
        let mut names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["add_numbers", "random_number", "time_reporter"]);
    }
}
