//! Page adapter: the only component that talks to the page player API.
//!
//! Inbound, it decodes raw envelopes into [`PageEvent`]s. Outbound, it maps
//! [`PlayerCommand`]s onto the page API. Advert volume compensation also
//! lives here because it needs both directions at once.

use crate::bridge::{
    PageEnvelope, PageEvent, PlayerCommand, Track, KIND_ADVERT, KIND_API_READY, KIND_THEME,
    KIND_TRACK,
};
use log::{error, info, warn};
use serde::Deserialize;
use tokio::sync::{mpsc, watch};

/// Player controls exposed by the embedded page.
pub trait PageApi: Send {
    fn next(&self);
    fn previous(&self);
    fn toggle_pause(&self);
    fn toggle_like(&self);
    fn set_volume(&self, value: f64);
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
struct AdvertPayload {
    playing: bool,
    volume: f64,
}

/// Transform applied to the live player volume around an advert.
///
/// The volume is rounded to two decimals first, then halved when an advert
/// starts and doubled when it ends. The transform is intentionally applied
/// to whatever the volume is at signal time rather than to a saved
/// baseline, so two consecutive start signals quarter the volume.
pub fn compensated_volume(volume: f64, advert_playing: bool) -> f64 {
    let rounded = (volume * 100.0).round() / 100.0;
    if advert_playing {
        rounded / 2.0
    } else {
        rounded * 2.0
    }
}

pub struct PageAdapter {
    api: Option<Box<dyn PageApi>>,
    ducking: bool,
}

impl PageAdapter {
    pub fn new(api: Option<Box<dyn PageApi>>, ducking: bool) -> Self {
        PageAdapter { api, ducking }
    }

    /// Decodes one envelope. Malformed track payloads are logged and
    /// dropped; unrecognized kinds are passed through for the router to
    /// report at its single dispatch point.
    fn decode(&self, envelope: PageEnvelope) -> Option<PageEvent> {
        match envelope.kind.as_str() {
            KIND_API_READY => Some(PageEvent::ApiReady),
            KIND_TRACK => match serde_json::from_value::<Track>(envelope.data) {
                Ok(track) => Some(PageEvent::TrackChanged(track)),
                Err(e) => {
                    error!("Malformed track payload: {e}");
                    None
                }
            },
            KIND_THEME => {
                let name = envelope.data.as_str().unwrap_or_default().to_string();
                Some(PageEvent::ThemeChanged { name })
            }
            KIND_ADVERT => match serde_json::from_value::<AdvertPayload>(envelope.data) {
                Ok(payload) => {
                    self.duck(payload);
                    Some(PageEvent::AdvertStateChanged {
                        playing: payload.playing,
                    })
                }
                Err(e) => {
                    error!("Malformed advert payload: {e}");
                    None
                }
            },
            _ => Some(PageEvent::Unknown {
                kind: envelope.kind,
                payload: envelope.data,
            }),
        }
    }

    fn duck(&self, payload: AdvertPayload) {
        if !self.ducking {
            return;
        }
        let Some(api) = self.api.as_ref() else {
            warn!("Advert volume change requested before the page was attached");
            return;
        };
        let adjusted = compensated_volume(payload.volume, payload.playing);
        info!("Advert {}: volume {} -> {adjusted}", if payload.playing { "started" } else { "ended" }, payload.volume);
        api.set_volume(adjusted);
    }

    fn execute(&self, command: PlayerCommand) {
        let Some(api) = self.api.as_ref() else {
            warn!("Dropping {command:?}: no page attached");
            return;
        };
        match command {
            PlayerCommand::Next => api.next(),
            PlayerCommand::Previous => api.previous(),
            PlayerCommand::TogglePause => api.toggle_pause(),
            PlayerCommand::ToggleLike => api.toggle_like(),
        }
    }

    pub async fn run(
        self,
        mut envelopes: mpsc::Receiver<PageEnvelope>,
        mut commands: mpsc::Receiver<PlayerCommand>,
        events: mpsc::Sender<PageEvent>,
        mut stop: watch::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                envelope = envelopes.recv() => {
                    let Some(envelope) = envelope else { break };
                    if let Some(event) = self.decode(envelope) {
                        if let Err(e) = events.send(event).await {
                            error!("Event channel closed: {e}");
                            break;
                        }
                    }
                }
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    self.execute(command);
                }
                _ = stop.changed() => break,
            }
        }
    }
}
