pub mod session;
pub mod task;

pub use session::{phase_label, Phase, SessionRecord};
pub use task::Task;
