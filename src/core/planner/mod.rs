pub mod command;
pub mod executor;
pub mod parser;
pub mod plan;
pub mod traits;

pub use command::{CommandType, PredictedCommand, PredictedDoCommand, PredictedSayCommand};
pub use executor::{CommandRecord, ExecutionReport, ExecutionStatus, PlanExecutor};
pub use parser::PlanParser;
pub use plan::Plan;
pub use traits::{Planner, PlannerOutput, PromptContext, ReplayPlanner};
