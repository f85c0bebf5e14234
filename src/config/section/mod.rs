//! Configuration section definitions.
//!
//! Each module corresponds to a section in `playground.toml`:
//!
//! | Module     | TOML Section   | Purpose                                  |
//! |------------|----------------|------------------------------------------|
//! | `workflow` | `[workflow]`   | Watchdog deadline, cancellation, overlap |
//! | `compiler` | `[compiler]`   | External compiler command                |
//! | `serve`    | `[serve]`      | Playground HTTP server                   |
//! | `export`   | `[export]`     | Download file name and directory         |

mod compiler;
mod export;
mod serve;
mod workflow;

pub use compiler::CompilerConfig;
pub use export::ExportConfig;
pub use serve::ServeConfig;
pub use workflow::{OverlapPolicy, WatchdogMode, WorkflowConfig};
