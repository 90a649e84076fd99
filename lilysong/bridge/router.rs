//! Single dispatch point for decoded page events.

use crate::bridge::settings::SettingsStore;
use crate::bridge::{PageEvent, Track};
use log::{error, info};
use tokio::sync::{mpsc, watch};

pub struct EventRouter {
    notify_tx: mpsc::Sender<Track>,
    settings: SettingsStore,
    notifications_enabled: bool,
}

impl EventRouter {
    pub fn new(
        notify_tx: mpsc::Sender<Track>,
        settings: SettingsStore,
        notifications_enabled: bool,
    ) -> Self {
        EventRouter {
            notify_tx,
            settings,
            notifications_enabled,
        }
    }

    async fn dispatch(&self, event: PageEvent) {
        match event {
            PageEvent::ApiReady => info!("Page player API is ready"),
            PageEvent::TrackChanged(track) => {
                if self.notifications_enabled {
                    if let Err(e) = self.notify_tx.send(track).await {
                        error!("Notification worker unavailable: {e}");
                    }
                }
            }
            PageEvent::ThemeChanged { name } => self.settings.set_theme(&name),
            PageEvent::AdvertStateChanged { playing } => {
                info!("Advert {}", if playing { "started" } else { "ended" });
            }
            PageEvent::Unknown { kind, payload } => {
                error!("Unhandled page event {kind}: {payload}");
            }
        }
    }

    pub async fn run(self, mut events: mpsc::Receiver<PageEvent>, mut stop: watch::Receiver<()>) {
        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else { break };
                    self.dispatch(event).await;
                }
                _ = stop.changed() => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn router(notifications: bool) -> (EventRouter, mpsc::Receiver<Track>, SettingsStore) {
        let (notify_tx, notify_rx) = mpsc::channel(8);
        let settings = SettingsStore::new();
        let router = EventRouter::new(notify_tx, settings.clone(), notifications);
        (router, notify_rx, settings)
    }

    #[tokio::test]
    async fn track_changes_reach_the_notification_worker() {
        let (router, mut notify_rx, _) = router(true);
        let track = Track {
            title: Some("Song".to_string()),
            ..Track::default()
        };
        router.dispatch(PageEvent::TrackChanged(track)).await;
        let received = notify_rx.try_recv().unwrap();
        assert_eq!(received.title.as_deref(), Some("Song"));
    }

    #[tokio::test]
    async fn notifications_gate_drops_tracks_when_disabled() {
        let (router, mut notify_rx, _) = router(false);
        router
            .dispatch(PageEvent::TrackChanged(Track::default()))
            .await;
        assert!(notify_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn theme_changes_update_the_settings_store() {
        let (router, _notify_rx, settings) = router(true);
        router
            .dispatch(PageEvent::ThemeChanged {
                name: "black".to_string(),
            })
            .await;
        assert_eq!(settings.theme().as_deref(), Some("black"));
    }

    #[tokio::test]
    async fn unknown_events_do_not_panic() {
        let (router, _notify_rx, _) = router(true);
        router
            .dispatch(PageEvent::Unknown {
                kind: "MYSTERY".to_string(),
                payload: json!({"a": 1}),
            })
            .await;
    }
}
