pub mod handlers;
pub mod history;
pub mod planner;
pub mod state;
pub mod storage;
