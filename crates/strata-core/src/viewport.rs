//! Host capabilities injected into the chart (viewport size, device class)

/// Width below which a viewport counts as mobile
pub const MOBILE_MAX_WIDTH: f64 = 576.0;

const MOBILE_AGENTS: &[&str] = &[
    "android",
    "blackberry",
    "iphone",
    "ipad",
    "ipod",
    "opera mini",
    "iemobile",
];

/// Device class used by the tick policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceClass {
    #[default]
    Desktop,
    Mobile,
}

impl DeviceClass {
    /// Classify from a user agent string and the current viewport width
    pub fn detect(user_agent: &str, viewport_width: f64) -> Self {
        let agent = user_agent.to_ascii_lowercase();
        let mobile_agent = MOBILE_AGENTS.iter().any(|m| agent.contains(m));

        if mobile_agent || viewport_width < MOBILE_MAX_WIDTH {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }

    pub fn is_mobile(&self) -> bool {
        matches!(self, Self::Mobile)
    }
}

/// Snapshot of the host environment taken at the start of every layout pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Rendered width of the mount element (0 when not laid out yet)
    pub container_width: f64,
    /// Width of the browser window
    pub viewport_width: f64,
    pub device: DeviceClass,
}

impl Viewport {
    pub fn new(container_width: f64, viewport_width: f64) -> Self {
        Self {
            container_width,
            viewport_width,
            device: DeviceClass::Desktop,
        }
    }

    pub fn with_device(mut self, device: DeviceClass) -> Self {
        self.device = device;
        self
    }

    pub fn mobile(self) -> Self {
        self.with_device(DeviceClass::Mobile)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 1280.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_agent() {
        let ua = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X)";
        assert_eq!(DeviceClass::detect(ua, 1024.0), DeviceClass::Mobile);

        let desktop = "Mozilla/5.0 (X11; Linux x86_64) Firefox/118.0";
        assert_eq!(DeviceClass::detect(desktop, 1024.0), DeviceClass::Desktop);
    }

    #[test]
    fn test_detect_by_width() {
        let desktop = "Mozilla/5.0 (X11; Linux x86_64) Firefox/118.0";
        assert!(DeviceClass::detect(desktop, 575.0).is_mobile());
        assert!(!DeviceClass::detect(desktop, 576.0).is_mobile());
    }
}
