//! Command handlers behind the `sift` subcommands.

pub mod filter_cmd;
pub mod predict_cmd;
pub mod render;
pub mod train_cmd;

pub use filter_cmd::{run_check, run_filter};
pub use predict_cmd::{run_inspect, run_predict};
pub use train_cmd::{run_evaluate, run_train};
