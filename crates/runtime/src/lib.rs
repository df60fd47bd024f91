pub mod run_gate;
pub mod status;

pub use run_gate::*;
pub use status::*;
