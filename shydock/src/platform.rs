use anyhow::Result;

use crate::bridge::BridgeError;
use crate::core::Display;

/// Trait for querying the current display topology.
/// This abstraction allows mocking in tests.
pub trait DisplaySystem {
    fn get_displays(&self) -> Vec<Display>;
}

/// One-shot access to the Dock auto-hide preference. No retries at this level.
pub trait DockAutomation: Send + Sync {
    fn set_autohide(&self, hide: bool) -> Result<(), BridgeError>;
    fn autohide(&self) -> Result<bool, BridgeError>;
}

/// Registration of the daemon as a login item.
pub trait LoginItems {
    fn set_enabled(&self, enabled: bool) -> Result<()>;
    fn is_enabled(&self) -> bool;
}

/// Accessibility trust, required for System Events to change the Dock.
pub trait AccessibilityPermission {
    fn is_trusted(&self) -> bool;
    /// Ask the system to show its permission dialog.
    fn request(&self);
}

/// macOS implementation of DisplaySystem
#[cfg(target_os = "macos")]
#[derive(Default)]
pub struct MacOSDisplaySystem;

#[cfg(target_os = "macos")]
impl DisplaySystem for MacOSDisplaySystem {
    fn get_displays(&self) -> Vec<Display> {
        crate::macos::get_all_displays()
    }
}

#[cfg(target_os = "macos")]
#[derive(Default)]
pub struct SystemAccessibility;

#[cfg(target_os = "macos")]
impl AccessibilityPermission for SystemAccessibility {
    fn is_trusted(&self) -> bool {
        crate::macos::check_accessibility(false)
    }

    fn request(&self) {
        crate::macos::check_accessibility(true);
    }
}

/// Drives the Dock preference through System Events.
#[derive(Default)]
pub struct SystemEventsAutomation;

impl DockAutomation for SystemEventsAutomation {
    fn set_autohide(&self, hide: bool) -> Result<(), BridgeError> {
        crate::macos::run_osascript(&crate::macos::set_autohide_script(hide)).map(|_| ())
    }

    fn autohide(&self) -> Result<bool, BridgeError> {
        let output = crate::macos::run_osascript(crate::macos::GET_AUTOHIDE_SCRIPT)?;
        crate::macos::parse_bool_output(&output)
    }
}

/// LaunchAgent-backed implementation of LoginItems
pub struct LaunchAgentLoginItems {
    agent: crate::macos::LaunchAgent,
}

impl LaunchAgentLoginItems {
    pub fn new(agent: crate::macos::LaunchAgent) -> Self {
        Self { agent }
    }
}

impl LoginItems for LaunchAgentLoginItems {
    fn set_enabled(&self, enabled: bool) -> Result<()> {
        if enabled {
            self.agent.install()
        } else {
            self.agent.uninstall()
        }
    }

    fn is_enabled(&self) -> bool {
        self.agent.is_installed()
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Shared handle so tests can change the topology while the scheduler owns a clone.
    #[derive(Clone, Default)]
    pub struct MockDisplaySystem {
        displays: Arc<Mutex<Vec<Display>>>,
    }

    impl MockDisplaySystem {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_displays(self, displays: Vec<Display>) -> Self {
            self.set_displays(displays);
            self
        }

        pub fn set_displays(&self, displays: Vec<Display>) {
            *self.displays.lock().unwrap() = displays;
        }
    }

    impl DisplaySystem for MockDisplaySystem {
        fn get_displays(&self) -> Vec<Display> {
            self.displays.lock().unwrap().clone()
        }
    }

    #[derive(Default)]
    struct AutomationInner {
        autohide: bool,
        errors: VecDeque<BridgeError>,
        apply_delays: VecDeque<Duration>,
        calls: usize,
        applied: Vec<bool>,
    }

    #[derive(Clone, Default)]
    pub struct MockDockAutomation {
        inner: Arc<Mutex<AutomationInner>>,
    }

    impl MockDockAutomation {
        pub fn new(autohide: bool) -> Self {
            let mock = Self::default();
            mock.inner.lock().unwrap().autohide = autohide;
            mock
        }

        /// Errors returned, in order, by the next calls
        pub fn push_errors(&self, errors: Vec<BridgeError>) {
            self.inner.lock().unwrap().errors.extend(errors);
        }

        /// Per-apply delays, in order, before the value is written
        pub fn push_apply_delays(&self, delays: Vec<Duration>) {
            self.inner.lock().unwrap().apply_delays.extend(delays);
        }

        /// Change the system value behind the daemon's back
        pub fn set_autohide_value(&self, autohide: bool) {
            self.inner.lock().unwrap().autohide = autohide;
        }

        pub fn autohide_value(&self) -> bool {
            self.inner.lock().unwrap().autohide
        }

        pub fn calls(&self) -> usize {
            self.inner.lock().unwrap().calls
        }

        pub fn pending_errors(&self) -> usize {
            self.inner.lock().unwrap().errors.len()
        }

        /// Values successfully applied, in completion order
        pub fn applied(&self) -> Vec<bool> {
            self.inner.lock().unwrap().applied.clone()
        }

        fn next_error(&self) -> Option<BridgeError> {
            let mut inner = self.inner.lock().unwrap();
            inner.calls += 1;
            inner.errors.pop_front()
        }
    }

    impl DockAutomation for MockDockAutomation {
        fn set_autohide(&self, hide: bool) -> Result<(), BridgeError> {
            if let Some(e) = self.next_error() {
                return Err(e);
            }
            let delay = self.inner.lock().unwrap().apply_delays.pop_front();
            if let Some(delay) = delay {
                std::thread::sleep(delay);
            }
            let mut inner = self.inner.lock().unwrap();
            inner.autohide = hide;
            inner.applied.push(hide);
            Ok(())
        }

        fn autohide(&self) -> Result<bool, BridgeError> {
            if let Some(e) = self.next_error() {
                return Err(e);
            }
            Ok(self.autohide_value())
        }
    }

    #[derive(Clone, Default)]
    pub struct MockLoginItems {
        enabled: Arc<Mutex<bool>>,
        fail: Arc<Mutex<bool>>,
    }

    impl MockLoginItems {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_failing(&self, fail: bool) {
            *self.fail.lock().unwrap() = fail;
        }
    }

    impl LoginItems for MockLoginItems {
        fn set_enabled(&self, enabled: bool) -> Result<()> {
            if *self.fail.lock().unwrap() {
                anyhow::bail!("login item registration refused");
            }
            *self.enabled.lock().unwrap() = enabled;
            Ok(())
        }

        fn is_enabled(&self) -> bool {
            *self.enabled.lock().unwrap()
        }
    }

    /// Permission state the test can flip while the scheduler polls it.
    #[derive(Clone)]
    pub struct MockAccessibility {
        trusted: Arc<Mutex<bool>>,
        requests: Arc<Mutex<usize>>,
    }

    impl MockAccessibility {
        pub fn new(trusted: bool) -> Self {
            Self {
                trusted: Arc::new(Mutex::new(trusted)),
                requests: Arc::new(Mutex::new(0)),
            }
        }

        pub fn set_trusted(&self, trusted: bool) {
            *self.trusted.lock().unwrap() = trusted;
        }

        pub fn requests(&self) -> usize {
            *self.requests.lock().unwrap()
        }
    }

    impl AccessibilityPermission for MockAccessibility {
        fn is_trusted(&self) -> bool {
            *self.trusted.lock().unwrap()
        }

        fn request(&self) {
            *self.requests.lock().unwrap() += 1;
        }
    }

    pub fn create_builtin_display(id: u32, width: f64, height: f64) -> Display {
        Display::new(id, true, width, height)
    }

    pub fn create_external_display(id: u32, width: f64, height: f64) -> Display {
        Display::new(id, false, width, height)
    }
}
