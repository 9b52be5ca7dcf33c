use std::ffi::c_void;

use core_graphics::display::{CGDirectDisplayID, CGDisplay, CGDisplayBounds};
use tokio::sync::mpsc;

use crate::core::{Display, DisplayId, DisplayReconfigEvent};

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGDisplayRegisterReconfigurationCallback(
        callback: unsafe extern "C" fn(CGDirectDisplayID, u32, *mut c_void),
        user_info: *mut c_void,
    ) -> i32;
    fn CGDisplayRemoveReconfigurationCallback(
        callback: unsafe extern "C" fn(CGDirectDisplayID, u32, *mut c_void),
        user_info: *mut c_void,
    ) -> i32;
}

/// kCGDisplayBeginConfigurationFlag: sent before the change takes effect.
const BEGIN_CONFIGURATION_FLAG: u32 = 1 << 0;

struct CallbackContext {
    tx: mpsc::UnboundedSender<DisplayReconfigEvent>,
}

unsafe extern "C" fn display_reconfig_callback(
    display_id: CGDirectDisplayID,
    flags: u32,
    user_info: *mut c_void,
) {
    if user_info.is_null() || flags & BEGIN_CONFIGURATION_FLAG != 0 {
        return;
    }
    let ctx = &*(user_info as *const CallbackContext);
    let _ = ctx.tx.send(DisplayReconfigEvent { display_id, flags });
}

/// Keeps the reconfiguration callback registered; unregisters on drop.
pub struct DisplayCallbackGuard {
    context: *mut CallbackContext,
}

impl Drop for DisplayCallbackGuard {
    fn drop(&mut self) {
        unsafe {
            CGDisplayRemoveReconfigurationCallback(
                display_reconfig_callback,
                self.context as *mut c_void,
            );
            drop(Box::from_raw(self.context));
        }
        tracing::info!("Display reconfiguration callback removed");
    }
}

/// Register for display reconfiguration. Callbacks are delivered on the
/// thread running the main CFRunLoop.
pub fn register_display_callback(
    tx: mpsc::UnboundedSender<DisplayReconfigEvent>,
) -> anyhow::Result<DisplayCallbackGuard> {
    let context = Box::into_raw(Box::new(CallbackContext { tx }));

    let result = unsafe {
        CGDisplayRegisterReconfigurationCallback(display_reconfig_callback, context as *mut c_void)
    };

    if result != 0 {
        unsafe { drop(Box::from_raw(context)) };
        anyhow::bail!("Failed to register display callback: {}", result);
    }

    tracing::info!("Display reconfiguration callback registered");
    Ok(DisplayCallbackGuard { context })
}

pub fn get_all_displays() -> Vec<Display> {
    get_active_display_ids()
        .into_iter()
        .map(|id| {
            // Bounds are in points, which is what the resolution filter compares against
            let rect = unsafe { CGDisplayBounds(id) };
            Display::new(
                id,
                CGDisplay::new(id).is_builtin(),
                rect.size.width,
                rect.size.height,
            )
        })
        .collect()
}

/// Get active display IDs using Core Graphics directly.
/// Unlike NSScreen::screens(), this doesn't depend on NSApplication's event loop.
fn get_active_display_ids() -> Vec<DisplayId> {
    use core_graphics::display::CGGetActiveDisplayList;

    const MAX_DISPLAYS: u32 = 16;
    let mut display_ids: [u32; 16] = [0; 16];
    let mut display_count: u32 = 0;

    let result = unsafe {
        CGGetActiveDisplayList(MAX_DISPLAYS, display_ids.as_mut_ptr(), &mut display_count)
    };

    if result != 0 {
        tracing::warn!("CGGetActiveDisplayList failed: {}", result);
        return Vec::new();
    }

    display_ids[..display_count as usize].to_vec()
}
