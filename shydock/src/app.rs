#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
mod channels;
mod command;
mod effects;
mod scheduler;
mod state_events;
mod worker;

use anyhow::Result;

pub struct App {}

#[cfg(target_os = "macos")]
impl App {
    pub fn run() -> Result<()> {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        use anyhow::Context;
        use core_foundation::runloop::{kCFRunLoopDefaultMode, CFRunLoop};

        use crate::core::{SchedulerConfig, SettingsStore};
        use crate::macos::{self, LaunchAgent};
        use crate::platform::{
            LaunchAgentLoginItems, MacOSDisplaySystem, SystemAccessibility, SystemEventsAutomation,
        };
        use channels::{create_channels, run_async};
        use scheduler::Services;

        let store = SettingsStore::default_location()?;
        tracing::info!("Settings file: {:?}", store.path());

        let services = Services {
            display_system: MacOSDisplaySystem,
            automation: SystemEventsAutomation,
            login_items: LaunchAgentLoginItems::new(LaunchAgent::for_current_user()?),
            accessibility: SystemAccessibility,
            store,
            config: SchedulerConfig::default(),
        };

        let (tokio_channels, main_channels) = create_channels();

        // Callbacks are delivered on this thread while its run loop is running
        let _display_guard = macos::register_display_callback(main_channels.display_reconfig_tx)?;

        let finished = Arc::new(AtomicBool::new(false));
        let finished_tokio = Arc::clone(&finished);

        // Spawn tokio runtime in separate thread
        let tokio_thread = std::thread::Builder::new()
            .name("shydock-tokio".to_string())
            .spawn(move || {
                let result = match tokio::runtime::Runtime::new() {
                    Ok(rt) => rt.block_on(run_async(tokio_channels, services)),
                    Err(e) => Err(e.into()),
                };
                finished_tokio.store(true, Ordering::Release);
                result
            })
            .context("Failed to spawn tokio thread")?;

        let context = Box::into_raw(Box::new(finished));
        let mut timer_context = core_foundation::runloop::CFRunLoopTimerContext {
            version: 0,
            info: context as *mut _,
            retain: None,
            release: None,
            copyDescription: None,
        };

        extern "C" fn timer_callback(
            _timer: core_foundation::runloop::CFRunLoopTimerRef,
            info: *mut std::ffi::c_void,
        ) {
            let finished = unsafe { &*(info as *const Arc<AtomicBool>) };
            if finished.load(Ordering::Acquire) {
                CFRunLoop::get_current().stop();
            }
        }

        let timer = unsafe {
            core_foundation::runloop::CFRunLoopTimer::new(
                core_foundation::date::CFAbsoluteTimeGetCurrent(),
                0.25,
                0,
                0,
                timer_callback,
                &mut timer_context,
            )
        };

        let run_loop = CFRunLoop::get_current();
        run_loop.add_timer(&timer, unsafe { kCFRunLoopDefaultMode });

        tracing::info!("Entering CFRunLoop");
        CFRunLoop::run_current();
        tracing::info!("CFRunLoop exited");

        run_loop.remove_timer(&timer, unsafe { kCFRunLoopDefaultMode });
        unsafe { drop(Box::from_raw(context)) };

        match tokio_thread.join() {
            Ok(result) => result,
            Err(_) => anyhow::bail!("Tokio thread panicked"),
        }
    }
}

#[cfg(not(target_os = "macos"))]
impl App {
    pub fn run() -> Result<()> {
        anyhow::bail!("shydock only runs on macOS")
    }
}
