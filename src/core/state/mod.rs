mod entry;
pub mod keys;
mod loader;
mod turn_state;
mod value;

pub use entry::StateEntry;
pub use keys::{CONVERSATION_LAYER, TEMP_LAYER, USER_LAYER};
pub use loader::{ScopeKeyFn, StateLoader, TurnKeys, load_scoped_state};
pub use turn_state::{HISTORY_KEY, SaveReport, TurnState};
pub use value::{Entities, Value};
