mod config;
mod display;
mod dock;

pub use config::*;
pub use display::*;
pub use dock::*;
