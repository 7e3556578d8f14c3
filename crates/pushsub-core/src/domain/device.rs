//! Platform detection
//!
//! Classifies the runtime environment from the signals a page can observe:
//! the user-agent string, the `display-mode: standalone` media query, the
//! iOS-only `navigator.standalone` flag and the touch-point count.
//!
//! Detection is pure and never fails. Unrecognised signals degrade to
//! [`Platform::Other`] and [`DisplayMode::Browser`].
//!
//! ## iOS
//!
//! iOS only delivers background push to apps added to the home screen. Its
//! browsers may answer the display-mode query with `standalone` even inside
//! a regular tab, so on iOS the `navigator.standalone` flag is the only
//! signal trusted for standalone detection.

use serde::{Deserialize, Serialize};

/// Platform family of the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// iPhone, iPad and iPod (including iPadOS reporting a desktop UA)
    Ios,
    /// Android phones and tablets
    Android,
    /// Windows, macOS, Linux and ChromeOS desktops
    Desktop,
    /// Anything else
    Other,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
            Platform::Desktop => "desktop",
            Platform::Other => "other",
        };
        write!(f, "{}", s)
    }
}

/// How the app is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Installed, chrome-less app
    Standalone,
    /// Regular browser tab
    Browser,
}

impl std::fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DisplayMode::Standalone => "standalone",
            DisplayMode::Browser => "browser",
        };
        write!(f, "{}", s)
    }
}

/// Raw environment signals collected by the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSignals {
    /// `navigator.userAgent`
    pub user_agent: String,
    /// Result of `matchMedia("(display-mode: standalone)")`
    pub display_mode_standalone: bool,
    /// `navigator.standalone`, only exposed by iOS browsers
    pub navigator_standalone: Option<bool>,
    /// `navigator.maxTouchPoints`
    pub max_touch_points: u32,
}

impl EnvironmentSignals {
    /// Creates signals from a user agent with every other signal unset
    pub fn from_user_agent(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            ..Self::default()
        }
    }
}

/// Classified device, computed once per session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub platform: Platform,
    pub display_mode: DisplayMode,
}

impl DeviceProfile {
    /// Creates a profile from already-classified values
    pub fn new(platform: Platform, display_mode: DisplayMode) -> Self {
        Self {
            platform,
            display_mode,
        }
    }

    /// Classifies the environment
    pub fn detect(signals: &EnvironmentSignals) -> Self {
        let platform = classify_platform(&signals.user_agent, signals.max_touch_points);
        let display_mode = classify_display_mode(platform, signals);
        Self {
            platform,
            display_mode,
        }
    }

    /// Returns true if the app must be installed to the home screen before
    /// push can work
    pub fn requires_install(&self) -> bool {
        self.platform == Platform::Ios && self.display_mode == DisplayMode::Browser
    }

    /// Returns true if the agent reports activation before it is actually
    /// ready, so the orchestrator waits an extra fixed delay
    pub fn needs_stabilization_delay(&self) -> bool {
        self.platform == Platform::Ios
    }

    /// Returns true if running as an installed app
    pub fn is_standalone(&self) -> bool {
        self.display_mode == DisplayMode::Standalone
    }
}

fn classify_platform(user_agent: &str, max_touch_points: u32) -> Platform {
    if ["iPhone", "iPad", "iPod"]
        .iter()
        .any(|marker| user_agent.contains(marker))
    {
        return Platform::Ios;
    }

    // iPadOS 13+ reports a desktop Safari UA; touch support gives it away.
    if user_agent.contains("Macintosh") && max_touch_points > 1 {
        return Platform::Ios;
    }

    // Android UAs also contain "Linux", so this check must come first.
    if user_agent.contains("Android") {
        return Platform::Android;
    }

    if ["Windows", "Macintosh", "X11", "Linux", "CrOS"]
        .iter()
        .any(|marker| user_agent.contains(marker))
    {
        return Platform::Desktop;
    }

    Platform::Other
}

fn classify_display_mode(platform: Platform, signals: &EnvironmentSignals) -> DisplayMode {
    let standalone = match platform {
        Platform::Ios => signals.navigator_standalone == Some(true),
        _ => signals.display_mode_standalone,
    };

    if standalone {
        DisplayMode::Standalone
    } else {
        DisplayMode::Browser
    }
}
