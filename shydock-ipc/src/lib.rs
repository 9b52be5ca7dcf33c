pub mod command;
pub mod event;

pub use command::{Command, DisplayInfo, DockVisibility, ResolutionPreset, Response, StateInfo};
pub use event::{EventFilter, StateEvent, SubscribeRequest};
