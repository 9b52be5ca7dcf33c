use shydock_ipc::{Command, DisplayInfo, Response};

use crate::core::{display_to_info, Settings};
use crate::effect::CommandResult;
use crate::platform::{AccessibilityPermission, DisplaySystem, DockAutomation, LoginItems};

use super::scheduler::Scheduler;

fn validate_dimension(name: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("Invalid {}: {}", name, value));
    }
    Ok(())
}

impl<D, A, L, P> Scheduler<D, A, L, P>
where
    D: DisplaySystem,
    A: DockAutomation + 'static,
    L: LoginItems,
    P: AccessibilityPermission,
{
    /// Apply a command to the controller and settings, returning the response
    /// and the effects still to run.
    pub(super) fn process_command(&mut self, cmd: &Command) -> CommandResult {
        match cmd {
            Command::ToggleDock => {
                CommandResult::ok_with_effects(self.controller.on_manual_toggle())
            }
            Command::SetResolution { width, height } => self.set_resolution(*width, *height),
            Command::SetLaunchAtLogin { enabled } => self.set_launch_at_login(*enabled),
            Command::GetState => CommandResult::with_response(Response::State {
                state: self.state_info(),
            }),
            Command::ListDisplays => {
                let filter = self.settings.filter();
                let displays: Vec<DisplayInfo> = self
                    .display_system
                    .get_displays()
                    .iter()
                    .map(|d| display_to_info(d, &filter))
                    .collect();
                CommandResult::with_response(Response::Displays { displays })
            }
            Command::Quit => CommandResult::ok(),
        }
    }

    fn set_resolution(&mut self, width: f64, height: f64) -> CommandResult {
        if let Err(message) =
            validate_dimension("width", width).and_then(|_| validate_dimension("height", height))
        {
            return CommandResult::error(message);
        }

        let settings = Settings {
            min_width: width,
            min_height: height,
            ..self.settings.clone()
        };
        tracing::info!("Resolution filter set to {}x{}", width, height);
        let saved = self.update_settings(settings);

        let connected = self.is_external_display_connected();
        let effects = self.controller.on_settings_changed(connected);

        match saved {
            Ok(()) => CommandResult::ok_with_effects(effects),
            Err(message) => CommandResult {
                response: Response::Error { message },
                effects,
            },
        }
    }

    /// The flag is persisted even when registration fails; the next start
    /// retries the registration.
    fn set_launch_at_login(&mut self, enabled: bool) -> CommandResult {
        let settings = Settings {
            launch_at_login: enabled,
            ..self.settings.clone()
        };
        tracing::info!("Launch at login {}", if enabled { "enabled" } else { "disabled" });
        let saved = self.update_settings(settings);

        if let Err(e) = self.login_items.set_enabled(enabled) {
            tracing::warn!("Failed to update login item: {:#}", e);
            return CommandResult::error(format!("Failed to update login item: {:#}", e));
        }

        match saved {
            Ok(()) => CommandResult::ok(),
            Err(message) => CommandResult::error(message),
        }
    }

    /// Adopt new settings, notify subscribers and persist them. The in-memory
    /// value is kept even if writing fails.
    fn update_settings(&mut self, settings: Settings) -> Result<(), String> {
        if settings == self.settings {
            return Ok(());
        }
        self.settings = settings;
        self.event_emitter.emit_settings_changed(&self.settings);
        self.store.save(&self.settings).map_err(|e| {
            tracing::error!("Failed to save settings: {:#}", e);
            format!("Failed to save settings: {:#}", e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_dimension() {
        assert!(validate_dimension("width", 0.0).is_ok());
        assert!(validate_dimension("width", 2560.0).is_ok());
        assert!(validate_dimension("width", -1.0).is_err());
        assert!(validate_dimension("height", f64::NAN).is_err());
        assert!(validate_dimension("height", f64::INFINITY).is_err());
    }
}
