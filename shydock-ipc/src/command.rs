use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    // Dock operations
    ToggleDock,

    // Settings
    SetResolution { width: f64, height: f64 },
    SetLaunchAtLogin { enabled: bool },

    // Queries
    GetState,
    ListDisplays,

    // Control
    Quit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Ok,
    Error { message: String },
    State { state: StateInfo },
    Displays { displays: Vec<DisplayInfo> },
}

/// Dock auto-hide state as last known by the daemon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DockVisibility {
    Hidden,
    Shown,
    #[default]
    Unknown,
}

impl DockVisibility {
    /// Map the system auto-hide preference to a visibility.
    pub fn from_autohide(autohide: bool) -> Self {
        if autohide {
            Self::Hidden
        } else {
            Self::Shown
        }
    }
}

impl fmt::Display for DockVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hidden => write!(f, "hidden"),
            Self::Shown => write!(f, "shown"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateInfo {
    pub external_display_connected: bool,
    pub dock: DockVisibility,
    pub min_width: f64,
    pub min_height: f64,
    pub launch_at_login: bool,
    /// Whether the daemon may drive System Events
    pub accessibility_trusted: bool,
    pub generation: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl StateInfo {
    /// One-line status suitable for a menu or terminal.
    pub fn status_line(&self) -> &'static str {
        if !self.accessibility_trusted {
            "Accessibility permission required"
        } else if self.external_display_connected {
            "Display connected • Dock showing"
        } else {
            "No display • Dock hidden"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayInfo {
    pub id: u32,
    pub is_builtin: bool,
    pub width: f64,
    pub height: f64,
    /// Whether this display counts as external under the current filter
    pub qualifies: bool,
}

/// Common minimum-resolution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPreset {
    Off,
    Hd,
    Qhd,
    Uhd,
}

impl ResolutionPreset {
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            Self::Off => (0.0, 0.0),
            Self::Hd => (1920.0, 1080.0),
            Self::Qhd => (2560.0, 1440.0),
            Self::Uhd => (3840.0, 2160.0),
        }
    }
}

impl FromStr for ResolutionPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" | "none" => Ok(Self::Off),
            "1080p" | "hd" => Ok(Self::Hd),
            "1440p" | "qhd" => Ok(Self::Qhd),
            "4k" | "2160p" | "uhd" => Ok(Self::Uhd),
            _ => Err(format!(
                "Unknown resolution preset: {} (use off, 1080p, 1440p, 4k)",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_set_resolution_serialization() {
        let cmd = Command::SetResolution {
            width: 2560.0,
            height: 1440.0,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("\"type\":\"set_resolution\""));
        assert!(json.contains("\"width\":2560.0"));

        let deserialized: Command = serde_json::from_str(&json).unwrap();
        match deserialized {
            Command::SetResolution { width, height } => {
                assert_eq!(width, 2560.0);
                assert_eq!(height, 1440.0);
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_command_unit_variants_parse() {
        let cmd: Command = serde_json::from_str(r#"{"type":"toggle_dock"}"#).unwrap();
        assert!(matches!(cmd, Command::ToggleDock));

        let cmd: Command = serde_json::from_str(r#"{"type":"quit"}"#).unwrap();
        assert!(matches!(cmd, Command::Quit));
    }

    #[test]
    fn test_dock_visibility_serialization() {
        let cases = [
            (DockVisibility::Hidden, "\"hidden\""),
            (DockVisibility::Shown, "\"shown\""),
            (DockVisibility::Unknown, "\"unknown\""),
        ];
        for (visibility, expected) in cases {
            assert_eq!(serde_json::to_string(&visibility).unwrap(), expected);
        }
    }

    #[test]
    fn test_dock_visibility_from_autohide() {
        assert_eq!(DockVisibility::from_autohide(true), DockVisibility::Hidden);
        assert_eq!(DockVisibility::from_autohide(false), DockVisibility::Shown);
    }

    #[test]
    fn test_state_info_omits_missing_error() {
        let state = StateInfo {
            external_display_connected: true,
            dock: DockVisibility::Shown,
            min_width: 0.0,
            min_height: 0.0,
            launch_at_login: false,
            accessibility_trusted: true,
            generation: 3,
            last_error: None,
        };
        let json = serde_json::to_string(&state).unwrap();
        assert!(!json.contains("last_error"));
        assert_eq!(state.status_line(), "Display connected • Dock showing");

        let untrusted = StateInfo {
            accessibility_trusted: false,
            ..state
        };
        assert_eq!(untrusted.status_line(), "Accessibility permission required");
    }

    #[test]
    fn test_resolution_preset_parse() {
        assert_eq!("1080p".parse(), Ok(ResolutionPreset::Hd));
        assert_eq!("1440P".parse(), Ok(ResolutionPreset::Qhd));
        assert_eq!("4k".parse(), Ok(ResolutionPreset::Uhd));
        assert_eq!("off".parse(), Ok(ResolutionPreset::Off));
        assert!("720p".parse::<ResolutionPreset>().is_err());
        assert_eq!(ResolutionPreset::Qhd.dimensions(), (2560.0, 1440.0));
    }
}
