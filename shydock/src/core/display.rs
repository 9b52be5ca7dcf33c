use shydock_ipc::DisplayInfo;

pub type DisplayId = u32;

/// An attached display as reported by the window server.
#[derive(Debug, Clone, PartialEq)]
pub struct Display {
    pub id: DisplayId,
    pub is_builtin: bool,
    pub width: f64,
    pub height: f64,
}

impl Display {
    pub fn new(id: DisplayId, is_builtin: bool, width: f64, height: f64) -> Self {
        Self {
            id,
            is_builtin,
            width,
            height,
        }
    }
}

/// Minimum size an external display needs before it counts.
/// A dimension of 1 or less disables filtering entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResolutionFilter {
    pub min_width: f64,
    pub min_height: f64,
}

impl ResolutionFilter {
    pub fn new(min_width: f64, min_height: f64) -> Self {
        Self {
            min_width,
            min_height,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.min_width <= 1.0 || self.min_height <= 1.0
    }

    /// Whether a display counts as a qualifying external display.
    pub fn accepts(&self, display: &Display) -> bool {
        if display.is_builtin {
            return false;
        }
        if self.is_disabled() {
            return true;
        }
        display.width >= self.min_width && display.height >= self.min_height
    }
}

/// A display was added, removed or reconfigured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayReconfigEvent {
    pub display_id: DisplayId,
    pub flags: u32,
}

pub fn list_external_displays(displays: &[Display], filter: &ResolutionFilter) -> Vec<Display> {
    displays
        .iter()
        .filter(|d| filter.accepts(d))
        .cloned()
        .collect()
}

pub fn is_any_external_display_connected(displays: &[Display], filter: &ResolutionFilter) -> bool {
    displays.iter().any(|d| filter.accepts(d))
}

pub fn display_to_info(display: &Display, filter: &ResolutionFilter) -> DisplayInfo {
    DisplayInfo {
        id: display.id,
        is_builtin: display.is_builtin,
        width: display.width,
        height: display.height,
        qualifies: filter.accepts(display),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin() -> Display {
        Display::new(1, true, 1792.0, 1120.0)
    }

    fn external(id: DisplayId, width: f64, height: f64) -> Display {
        Display::new(id, false, width, height)
    }

    #[test]
    fn test_disabled_filter_accepts_any_external_size() {
        let displays = vec![
            builtin(),
            external(2, 800.0, 600.0),
            external(3, 5120.0, 2880.0),
        ];
        for filter in [
            ResolutionFilter::new(0.0, 0.0),
            ResolutionFilter::new(1.0, 4000.0),
            ResolutionFilter::new(4000.0, 1.0),
            ResolutionFilter::new(-5.0, 1080.0),
        ] {
            let found = list_external_displays(&displays, &filter);
            let ids: Vec<DisplayId> = found.iter().map(|d| d.id).collect();
            assert_eq!(ids, vec![2, 3], "filter {:?}", filter);
        }
    }

    #[test]
    fn test_enabled_filter_requires_both_dimensions() {
        let filter = ResolutionFilter::new(1920.0, 1080.0);
        assert!(filter.accepts(&external(2, 1920.0, 1080.0)));
        assert!(filter.accepts(&external(2, 2560.0, 1440.0)));
        assert!(!filter.accepts(&external(2, 1919.0, 1200.0)));
        assert!(!filter.accepts(&external(2, 2560.0, 1079.0)));
        assert!(!filter.accepts(&Display::new(1, true, 3840.0, 2160.0)));
    }

    #[test]
    fn test_builtin_only_is_not_connected() {
        let displays = vec![builtin()];
        let filter = ResolutionFilter::default();
        assert!(!is_any_external_display_connected(&displays, &filter));
        assert!(list_external_displays(&displays, &filter).is_empty());
    }

    #[test]
    fn test_small_external_rejected_by_qhd_filter() {
        let displays = vec![builtin(), external(2, 1920.0, 1080.0)];
        let filter = ResolutionFilter::new(2560.0, 1440.0);
        assert!(!is_any_external_display_connected(&displays, &filter));
    }

    #[test]
    fn test_external_matches_hd_filter() {
        let displays = vec![builtin(), external(2, 1920.0, 1080.0)];
        let filter = ResolutionFilter::new(1920.0, 1080.0);
        assert!(is_any_external_display_connected(&displays, &filter));
    }

    #[test]
    fn test_display_to_info_reports_qualification() {
        let filter = ResolutionFilter::new(2560.0, 1440.0);
        let info = display_to_info(&external(7, 1920.0, 1080.0), &filter);
        assert_eq!(info.id, 7);
        assert!(!info.is_builtin);
        assert!(!info.qualifies);
    }
}
