use shydock_ipc::Response;

pub type Generation = u64;

/// Side effects requested by the dock controller. Executed by the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Run the bridge apply on a worker thread
    ApplyAutohide { generation: Generation, hide: bool },
    /// Wait the settle delay, then ask the controller whether to verify
    ScheduleVerify { generation: Generation },
    /// Run the bridge query on a worker thread
    QueryAutohide { generation: Generation },
    /// Non-fatal failure to surface to observers
    Warn { message: String },
}

pub struct CommandResult {
    pub response: Response,
    pub effects: Vec<Effect>,
}

impl CommandResult {
    pub fn ok() -> Self {
        Self {
            response: Response::Ok,
            effects: vec![],
        }
    }

    pub fn ok_with_effects(effects: Vec<Effect>) -> Self {
        Self {
            response: Response::Ok,
            effects,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            response: Response::Error {
                message: message.into(),
            },
            effects: vec![],
        }
    }

    pub fn with_response(response: Response) -> Self {
        Self {
            response,
            effects: vec![],
        }
    }
}
