//! Track notifications: what to show, which action to offer, and the
//! notify-rust rendering of both.

use crate::bridge::{PlayerCommand, Track};
use crate::window::HostWindow;
use log::{debug, error, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

pub const DEFAULT_TITLE: &str = "Unknown track";
pub const DEFAULT_ARTIST: &str = "Unknown artist";
pub const DEFAULT_ALBUM: &str = "Unknown album";

/// Size substituted into the cover template the page ships.
const COVER_SIZE: &str = "80x80";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyAction {
    Skip,
    Like,
}

impl NotifyAction {
    pub fn command(self) -> PlayerCommand {
        match self {
            NotifyAction::Skip => PlayerCommand::Next,
            NotifyAction::Like => PlayerCommand::ToggleLike,
        }
    }

    fn identifier(self) -> &'static str {
        match self {
            NotifyAction::Skip => "skip",
            NotifyAction::Like => "like",
        }
    }

    fn label(self) -> &'static str {
        match self {
            NotifyAction::Skip => "Skip",
            NotifyAction::Like => "Like",
        }
    }
}

/// Buttons offered on a notification. A liked track only offers skipping;
/// an unliked one offers liking, with skip demoted to the secondary slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationActions {
    pub primary: NotifyAction,
    pub secondary_skip: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackNotification {
    pub summary: String,
    pub body: String,
    pub icon_url: Option<String>,
    pub actions: NotificationActions,
}

impl TrackNotification {
    pub fn build(track: &Track) -> Self {
        let title = track
            .title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE);
        // The artist line shows the first of the ordered artist list only.
        let artist = track
            .artists
            .first()
            .and_then(|a| a.title.as_deref())
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_ARTIST);
        let album = track
            .album
            .as_ref()
            .and_then(|a| a.title.as_deref())
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_ALBUM);
        let heart = if track.liked { "\u{2764} " } else { "" };

        // The page ships the cover as a protocol-less URL template; only a
        // template with a size placeholder yields a usable icon.
        let icon_url = track
            .cover
            .as_deref()
            .filter(|c| c.contains("%%"))
            .map(|c| format!("https://{}", c.replace("%%", COVER_SIZE)));

        let actions = if track.liked {
            NotificationActions {
                primary: NotifyAction::Skip,
                secondary_skip: false,
            }
        } else {
            NotificationActions {
                primary: NotifyAction::Like,
                secondary_skip: true,
            }
        };

        TrackNotification {
            summary: title.to_string(),
            body: format!("{heart}{artist} \u{2014} {album}"),
            icon_url,
            actions,
        }
    }
}

pub struct Notifier {
    commands_tx: mpsc::Sender<PlayerCommand>,
    window: Arc<dyn HostWindow>,
    http: reqwest::Client,
}

impl Notifier {
    pub fn new(commands_tx: mpsc::Sender<PlayerCommand>, window: Arc<dyn HostWindow>) -> Self {
        Notifier {
            commands_tx,
            window,
            http: reqwest::Client::new(),
        }
    }

    pub async fn run(self, mut tracks: mpsc::Receiver<Track>, mut stop: watch::Receiver<()>) {
        loop {
            tokio::select! {
                track = tracks.recv() => {
                    let Some(track) = track else { break };
                    self.show(&track).await;
                }
                _ = stop.changed() => break,
            }
        }
    }

    async fn show(&self, track: &Track) {
        let note = TrackNotification::build(track);
        let icon = match &note.icon_url {
            Some(url) => self.fetch_cover(url).await,
            None => None,
        };

        let mut builder = notify_rust::Notification::new();
        builder
            .summary(&note.summary)
            .body(&note.body)
            .appname("Lilysong");
        if let Some(path) = &icon {
            builder.icon(&path.to_string_lossy());
        }
        builder.action(note.actions.primary.identifier(), note.actions.primary.label());
        if note.actions.secondary_skip {
            builder.action(NotifyAction::Skip.identifier(), NotifyAction::Skip.label());
        }

        self.present(&mut builder);
    }

    /// Best-effort cover download for the notification icon.
    async fn fetch_cover(&self, url: &str) -> Option<PathBuf> {
        let response = match self.http.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!("Cover download failed: {e}");
                return None;
            }
        };
        let bytes = response.bytes().await.ok()?;
        let path = std::env::temp_dir().join("lilysong-cover.png");
        match std::fs::write(&path, &bytes) {
            Ok(()) => Some(path),
            Err(e) => {
                debug!("Cover write failed: {e}");
                None
            }
        }
    }

    /// Shows the notification and, where the backend reports them,
    /// watches for clicks and action presses. `show` returns a handle only
    /// on XDG backends, so the fallback never names the handle type.
    #[cfg(all(unix, not(target_os = "macos")))]
    fn present(&self, builder: &mut notify_rust::Notification) {
        match builder.show() {
            Ok(handle) => {
                let commands_tx = self.commands_tx.clone();
                let window = self.window.clone();
                tokio::task::spawn_blocking(move || {
                    handle.wait_for_action(|action| match action {
                        "default" => window.bring_to_front(),
                        "skip" => dispatch(&commands_tx, NotifyAction::Skip),
                        "like" => dispatch(&commands_tx, NotifyAction::Like),
                        _ => {}
                    });
                });
            }
            Err(e) => error!("Failed to show notification: {e}"),
        }
    }

    #[cfg(not(all(unix, not(target_os = "macos"))))]
    fn present(&self, builder: &mut notify_rust::Notification) {
        // No click or action reporting on this backend.
        if let Err(e) = builder.show() {
            error!("Failed to show notification: {e}");
        }
        let _ = (&self.commands_tx, &self.window);
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
fn dispatch(commands_tx: &mpsc::Sender<PlayerCommand>, action: NotifyAction) {
    if let Err(e) = commands_tx.try_send(action.command()) {
        warn!("Dropping {action:?} from a stale notification: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{Album, Artist};

    fn track(title: Option<&str>, artists: &[&str], album: Option<&str>, liked: bool) -> Track {
        Track {
            title: title.map(String::from),
            artists: artists
                .iter()
                .map(|t| Artist {
                    title: Some((*t).to_string()),
                })
                .collect(),
            album: album.map(|t| Album {
                title: Some(t.to_string()),
            }),
            cover: None,
            liked,
        }
    }

    #[test]
    fn empty_track_uses_display_defaults() {
        let note = TrackNotification::build(&Track::default());
        assert_eq!(note.summary, DEFAULT_TITLE);
        assert_eq!(note.body, format!("{DEFAULT_ARTIST} \u{2014} {DEFAULT_ALBUM}"));
        assert!(note.icon_url.is_none());
    }

    #[test]
    fn only_the_first_artist_is_shown() {
        let note = TrackNotification::build(&track(Some("T"), &["A", "B"], Some("L"), false));
        assert_eq!(note.body, "A \u{2014} L");
    }

    #[test]
    fn empty_first_artist_falls_back_to_the_default() {
        let note = TrackNotification::build(&track(Some("T"), &["", "B"], Some("L"), false));
        assert_eq!(note.body, format!("{DEFAULT_ARTIST} \u{2014} L"));
    }

    #[test]
    fn liked_track_gets_a_heart_on_the_body_and_skip_only() {
        let note = TrackNotification::build(&track(Some("T"), &["A"], Some("L"), true));
        assert_eq!(note.summary, "T");
        assert_eq!(note.body, "\u{2764} A \u{2014} L");
        assert_eq!(note.actions.primary, NotifyAction::Skip);
        assert!(!note.actions.secondary_skip);
    }

    #[test]
    fn unliked_track_offers_like_with_skip_fallback() {
        let note = TrackNotification::build(&track(Some("T"), &["A"], None, false));
        assert_eq!(note.actions.primary, NotifyAction::Like);
        assert!(note.actions.secondary_skip);
    }

    #[test]
    fn cover_template_expands_to_an_icon_url() {
        let mut t = Track::default();
        t.cover = Some("avatars.example/get-music/1/%%".to_string());
        let note = TrackNotification::build(&t);
        assert_eq!(
            note.icon_url.as_deref(),
            Some("https://avatars.example/get-music/1/80x80")
        );
    }

    #[test]
    fn cover_without_placeholder_yields_no_icon() {
        let mut t = Track::default();
        t.cover = Some("avatars.example/get-music/1/cover.jpg".to_string());
        assert!(TrackNotification::build(&t).icon_url.is_none());
    }

    #[test]
    fn actions_map_to_player_commands() {
        assert_eq!(NotifyAction::Skip.command(), PlayerCommand::Next);
        assert_eq!(NotifyAction::Like.command(), PlayerCommand::ToggleLike);
    }

    #[test]
    fn title_only_track_builds_without_panicking() {
        let note = TrackNotification::build(&track(Some("Solo"), &[], None, false));
        assert_eq!(note.summary, "Solo");
    }
}
