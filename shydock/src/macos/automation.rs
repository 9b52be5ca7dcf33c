use std::process::{Command, Stdio};
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::bridge::BridgeError;

pub const GET_AUTOHIDE_SCRIPT: &str =
    "tell application \"System Events\" to get autohide of dock preferences";

const OSASCRIPT_PATH: &str = "/usr/bin/osascript";
const OSASCRIPT_TIMEOUT: Duration = Duration::from_secs(2);

// AppleScript / Apple event error codes
const ERR_APP_NOT_RUNNING: i32 = -600;
const ERR_CONNECTION_INVALID: i32 = -609;
const ERR_NOT_AUTHORIZED: i32 = -1743;

pub fn set_autohide_script(hide: bool) -> String {
    format!(
        "tell application \"System Events\" to set autohide of dock preferences to {}",
        hide
    )
}

/// Run a single AppleScript and return its trimmed stdout.
pub fn run_osascript(script: &str) -> Result<String, BridgeError> {
    let mut child = Command::new(OSASCRIPT_PATH)
        .arg("-e")
        .arg(script)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| BridgeError::Rejected {
            message: format!("failed to spawn osascript: {}", e),
        })?;

    match child.wait_timeout(OSASCRIPT_TIMEOUT) {
        Ok(Some(_)) => {}
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            tracing::warn!("osascript timed out after {:?}", OSASCRIPT_TIMEOUT);
            return Err(BridgeError::TimedOut);
        }
        Err(e) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(BridgeError::Rejected {
                message: format!("failed to wait for osascript: {}", e),
            });
        }
    }

    let output = child
        .wait_with_output()
        .map_err(|e| BridgeError::Rejected {
            message: format!("failed to read osascript output: {}", e),
        })?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::debug!("osascript failed: {}", stderr.trim());
        Err(classify_error(&stderr))
    }
}

/// Map osascript stderr, e.g.
/// `execution error: System Events got an error: Application isn't running. (-600)`.
pub fn classify_error(stderr: &str) -> BridgeError {
    let message = stderr.trim().to_string();
    match parse_error_code(&message) {
        Some(ERR_APP_NOT_RUNNING) | Some(ERR_CONNECTION_INVALID) => BridgeError::Unavailable,
        Some(ERR_NOT_AUTHORIZED) => BridgeError::PermissionDenied { message },
        _ => BridgeError::Rejected { message },
    }
}

fn parse_error_code(message: &str) -> Option<i32> {
    let open = message.rfind('(')?;
    let close = message[open..].find(')')? + open;
    message[open + 1..close].trim().parse().ok()
}

pub fn parse_bool_output(output: &str) -> Result<bool, BridgeError> {
    match output.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(BridgeError::Rejected {
            message: format!("unexpected autohide value: {:?}", other),
        }),
    }
}
