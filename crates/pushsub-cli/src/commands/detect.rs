//! Detect command - Classify a device from its environment signals
//!
//! Runs the same detection the orchestrator uses, so a support request
//! carrying a user-agent string can be checked without the device at hand.

use anyhow::Result;
use clap::Args;
use pushsub_core::domain::{DeviceProfile, EnvironmentSignals};

use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct DetectCommand {
    /// User-agent string reported by the browser
    #[arg(long)]
    pub user_agent: String,

    /// The `display-mode: standalone` media query matched
    #[arg(long)]
    pub standalone: bool,

    /// `navigator.standalone` was true (iOS only)
    #[arg(long)]
    pub navigator_standalone: bool,

    /// `navigator.maxTouchPoints`
    #[arg(long, default_value_t = 0)]
    pub touch_points: u32,
}

impl DetectCommand {
    pub fn signals(&self) -> EnvironmentSignals {
        EnvironmentSignals {
            user_agent: self.user_agent.clone(),
            display_mode_standalone: self.standalone,
            navigator_standalone: self.navigator_standalone.then_some(true),
            max_touch_points: self.touch_points,
        }
    }

    pub async fn execute(&self, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let profile = DeviceProfile::detect(&self.signals());

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "platform": profile.platform,
                "displayMode": profile.display_mode,
                "requiresInstall": profile.requires_install(),
                "stabilizationDelay": profile.needs_stabilization_delay(),
            }));
            return Ok(());
        }

        formatter.success(&format!(
            "Platform: {} ({})",
            profile.platform, profile.display_mode
        ));
        if profile.requires_install() {
            formatter.warn("Push is blocked until the app is added to the home screen");
        }
        if profile.needs_stabilization_delay() {
            formatter.info("Agent activation is followed by a stabilization delay");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pushsub_core::domain::{DisplayMode, Platform};

    const IPHONE_UA: &str =
        "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148";

    fn cmd(user_agent: &str) -> DetectCommand {
        DetectCommand {
            user_agent: user_agent.to_string(),
            standalone: false,
            navigator_standalone: false,
            touch_points: 0,
        }
    }

    #[test]
    fn test_iphone_in_browser_requires_install() {
        let profile = DeviceProfile::detect(&cmd(IPHONE_UA).signals());
        assert_eq!(profile.platform, Platform::Ios);
        assert!(profile.requires_install());
    }

    #[test]
    fn test_iphone_media_query_alone_is_not_standalone() {
        let mut command = cmd(IPHONE_UA);
        command.standalone = true;
        let profile = DeviceProfile::detect(&command.signals());
        assert_eq!(profile.display_mode, DisplayMode::Browser);

        command.navigator_standalone = true;
        let profile = DeviceProfile::detect(&command.signals());
        assert_eq!(profile.display_mode, DisplayMode::Standalone);
    }

    #[test]
    fn test_navigator_flag_unset_when_not_passed() {
        assert_eq!(cmd(IPHONE_UA).signals().navigator_standalone, None);
    }
}
