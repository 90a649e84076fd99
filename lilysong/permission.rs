//! Input-monitoring permission gate.
//!
//! Media key events count as input monitoring on macOS 10.15 and later, so
//! registration is useless until the user grants access. The gate resolves
//! the permission up front, walking the user through remediation when it is
//! denied, and stays out of the way everywhere else.

use log::{info, warn};
use std::process;
use std::time::Duration;

/// Delay before re-querying after the user picked "remind me later". The
/// grant dialog needs a moment to settle before the next query is honest.
pub const RECHECK_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Unknown,
    Granted,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemedyChoice {
    OpenSettings,
    RemindLater,
    Relaunch,
}

/// Queries the OS for the input-monitoring grant.
pub trait InputMonitorProbe: Send {
    /// Whether this OS gates media key registration at all.
    fn gating_applies(&self) -> bool;
    fn granted(&self) -> bool;
}

/// Presents the remediation choices and performs the chosen remedy.
pub trait RemediationPrompt: Send {
    fn present(&self) -> RemedyChoice;
    fn open_privacy_settings(&self);
    fn relaunch(&self);
}

/// Resolves the permission to a final state. Opening the settings pane
/// loops back through a fresh query and, if still denied, a fresh prompt;
/// "remind me later" re-queries once after [`RECHECK_DELAY`] and accepts
/// whatever it finds.
pub async fn resolve(
    probe: &(dyn InputMonitorProbe + Sync),
    prompt: &(dyn RemediationPrompt + Sync),
) -> PermissionState {
    if !probe.gating_applies() {
        return PermissionState::Granted;
    }
    let mut state = PermissionState::Unknown;
    loop {
        match state {
            PermissionState::Unknown => {
                state = if probe.granted() {
                    PermissionState::Granted
                } else {
                    PermissionState::Denied
                };
            }
            PermissionState::Granted => return PermissionState::Granted,
            PermissionState::Denied => match prompt.present() {
                RemedyChoice::OpenSettings => {
                    prompt.open_privacy_settings();
                    state = PermissionState::Unknown;
                }
                RemedyChoice::RemindLater => {
                    tokio::time::sleep(RECHECK_DELAY).await;
                    return if probe.granted() {
                        PermissionState::Granted
                    } else {
                        PermissionState::Denied
                    };
                }
                RemedyChoice::Relaunch => {
                    prompt.relaunch();
                    return PermissionState::Denied;
                }
            },
        }
    }
}

#[cfg(target_os = "macos")]
#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGPreflightListenEventAccess() -> bool;
}

pub struct SystemProbe;

#[cfg(target_os = "macos")]
impl InputMonitorProbe for SystemProbe {
    fn gating_applies(&self) -> bool {
        let output = process::Command::new("sw_vers")
            .arg("-productVersion")
            .output();
        let Ok(output) = output else { return true };
        let version = String::from_utf8_lossy(&output.stdout);
        let mut parts = version.trim().split('.');
        let major: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
        let minor: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
        major > 10 || (major == 10 && minor >= 15)
    }

    fn granted(&self) -> bool {
        unsafe { CGPreflightListenEventAccess() }
    }
}

#[cfg(not(target_os = "macos"))]
impl InputMonitorProbe for SystemProbe {
    fn gating_applies(&self) -> bool {
        false
    }

    fn granted(&self) -> bool {
        true
    }
}

/// Headless prompt: logs the situation and defers instead of blocking on a
/// dialog nobody can see.
pub struct LogPrompt;

impl RemediationPrompt for LogPrompt {
    fn present(&self) -> RemedyChoice {
        warn!("Input monitoring permission is denied; media keys will not work");
        RemedyChoice::RemindLater
    }

    fn open_privacy_settings(&self) {
        open_privacy_pane();
    }

    fn relaunch(&self) {
        relaunch_current_exe();
    }
}

#[cfg(feature = "shell")]
pub struct DialogPrompt;

#[cfg(feature = "shell")]
impl RemediationPrompt for DialogPrompt {
    fn present(&self) -> RemedyChoice {
        let result = rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Warning)
            .set_title("Lilysong")
            .set_description(
                "Media keys need the Input Monitoring permission. \
                 Grant it in System Settings, then relaunch.",
            )
            .set_buttons(rfd::MessageButtons::YesNoCancelCustom(
                "Open settings".to_string(),
                "Remind me later".to_string(),
                "Relaunch".to_string(),
            ))
            .show();
        match result {
            rfd::MessageDialogResult::Custom(label) if label == "Open settings" => {
                RemedyChoice::OpenSettings
            }
            rfd::MessageDialogResult::Custom(label) if label == "Relaunch" => {
                RemedyChoice::Relaunch
            }
            _ => RemedyChoice::RemindLater,
        }
    }

    fn open_privacy_settings(&self) {
        open_privacy_pane();
    }

    fn relaunch(&self) {
        relaunch_current_exe();
    }
}

fn open_privacy_pane() {
    #[cfg(target_os = "macos")]
    {
        let result = process::Command::new("open")
            .arg("x-apple.systempreferences:com.apple.preference.security?Privacy_ListenEvent")
            .spawn();
        if let Err(e) = result {
            warn!("Could not open the privacy settings pane: {e}");
        }
    }
    #[cfg(not(target_os = "macos"))]
    info!("No privacy settings pane on this platform");
}

fn relaunch_current_exe() {
    match std::env::current_exe() {
        Ok(exe) => {
            info!("Relaunching {}", exe.display());
            if let Err(e) = process::Command::new(exe).spawn() {
                warn!("Relaunch failed: {e}");
                return;
            }
            process::exit(0);
        }
        Err(e) => warn!("Could not locate the current executable: {e}"),
    }
}
