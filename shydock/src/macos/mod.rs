#[cfg(target_os = "macos")]
mod accessibility;
mod automation;
#[cfg(target_os = "macos")]
mod display;
mod login_item;

#[cfg(target_os = "macos")]
pub use accessibility::*;
pub use automation::*;
#[cfg(target_os = "macos")]
pub use display::*;
pub use login_item::*;
