//! Startup update check. Strictly best effort: any failure is logged and
//! the player starts as usual.

use log::{info, warn};
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use std::cmp::Ordering;

const LATEST_RELEASE_URL: &str =
    "https://api.github.com/repos/lilysong/lilysong/releases/latest";

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    pub html_url: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PreId {
    Num(u64),
    Alpha(String),
}

/// Version with semver precedence: numeric identifiers compare
/// numerically and below alphanumeric ones, a release outranks any of its
/// pre-releases, and build metadata is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    major: u64,
    minor: u64,
    patch: u64,
    pre: Vec<PreId>,
}

impl Version {
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let text = text.strip_prefix(['v', 'V']).unwrap_or(text);
        let text = text.split('+').next()?;
        let (core, pre) = match text.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (text, None),
        };
        let mut parts = core.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        let pre = match pre {
            None => Vec::new(),
            Some(pre) => pre
                .split('.')
                .map(|id| match id.parse() {
                    Ok(n) => PreId::Num(n),
                    Err(_) => PreId::Alpha(id.to_string()),
                })
                .collect(),
        };
        Some(Version {
            major,
            minor,
            patch,
            pre,
        })
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let core = (self.major, self.minor, self.patch).cmp(&(
            other.major,
            other.minor,
            other.patch,
        ));
        if core != Ordering::Equal {
            return core;
        }
        match (self.pre.is_empty(), other.pre.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                for (a, b) in self.pre.iter().zip(&other.pre) {
                    let step = match (a, b) {
                        (PreId::Num(a), PreId::Num(b)) => a.cmp(b),
                        (PreId::Alpha(a), PreId::Alpha(b)) => a.cmp(b),
                        (PreId::Num(_), PreId::Alpha(_)) => Ordering::Less,
                        (PreId::Alpha(_), PreId::Num(_)) => Ordering::Greater,
                    };
                    if step != Ordering::Equal {
                        return step;
                    }
                }
                self.pre.len().cmp(&other.pre.len())
            }
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// How a found update is surfaced to the user. Returns whether the user
/// asked to open the download page.
pub trait UpdatePrompt: Send {
    fn offer(&self, release: &Release) -> bool;
}

pub struct LogOnlyPrompt;

impl UpdatePrompt for LogOnlyPrompt {
    fn offer(&self, release: &Release) -> bool {
        info!(
            "Update available: {} ({})",
            release.tag_name, release.html_url
        );
        false
    }
}

#[cfg(feature = "shell")]
pub struct DialogUpdatePrompt;

#[cfg(feature = "shell")]
impl UpdatePrompt for DialogUpdatePrompt {
    fn offer(&self, release: &Release) -> bool {
        let result = rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Info)
            .set_title("Lilysong update")
            .set_description(format!(
                "Version {} is available.\n\n{}",
                release.tag_name, release.body
            ))
            .set_buttons(rfd::MessageButtons::OkCancelCustom(
                "Open download page".to_string(),
                "Dismiss".to_string(),
            ))
            .show();
        matches!(result, rfd::MessageDialogResult::Custom(label) if label == "Open download page")
    }
}

pub async fn check(current: &str, prompt: &(dyn UpdatePrompt + Sync)) {
    let client = reqwest::Client::new();
    let response = client
        .get(LATEST_RELEASE_URL)
        .header(USER_AGENT, concat!("lilysong/", env!("CARGO_PKG_VERSION")))
        .send()
        .await;
    let release: Release = match response {
        Ok(response) => match response.json().await {
            Ok(release) => release,
            Err(e) => {
                warn!("Update check: bad response: {e}");
                return;
            }
        },
        Err(e) => {
            warn!("Update check failed: {e}");
            return;
        }
    };

    let Some(latest) = Version::parse(&release.tag_name) else {
        warn!("Update check: unparseable tag {}", release.tag_name);
        return;
    };
    let Some(running) = Version::parse(current) else {
        warn!("Update check: unparseable running version {current}");
        return;
    };
    if latest <= running {
        info!("Running the latest version");
        return;
    }
    if prompt.offer(&release) {
        open_in_browser(&release.html_url);
    }
}

fn open_in_browser(url: &str) {
    #[cfg(target_os = "macos")]
    let opener = "open";
    #[cfg(not(target_os = "macos"))]
    let opener = "xdg-open";
    if let Err(e) = std::process::Command::new(opener).arg(url).spawn() {
        warn!("Could not open {url}: {e}");
    }
}
