pub mod executor;
pub mod step;

pub use step::{run_process_step, ProcessStep};
