mod initializer;
mod runner;
mod status;

pub use initializer::{InitSettings, StoreHandles, StoreInitializer};
pub use runner::{run, RunOptions, ShutdownOptions};
pub use status::StartupStatus;
