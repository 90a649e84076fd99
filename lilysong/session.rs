//! Session wiring: channels, background tasks, and the one shutdown path.

use crate::appearance::Appearance;
use crate::bridge::adapter::{PageAdapter, PageApi};
use crate::bridge::router::EventRouter;
use crate::bridge::settings::SettingsStore;
use crate::bridge::{PageEnvelope, PlayerCommand};
use crate::config::Config;
use crate::keys::{MediaKeys, SouvlakiSurface};
use crate::notify::Notifier;
use crate::permission::{self, PermissionState, RemediationPrompt, SystemProbe};
use crate::update::{self, UpdatePrompt};
use crate::window::HostWindow;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task;

enum KeysRequest {
    Register,
    Shutdown,
}

pub struct Session {
    raw_tx: mpsc::Sender<PageEnvelope>,
    commands_tx: mpsc::Sender<PlayerCommand>,
    keys_tx: std::sync::mpsc::Sender<KeysRequest>,
    stop_tx: watch::Sender<()>,
    settings: SettingsStore,
}

impl Session {
    /// Builds the channel graph and spawns every background task. The
    /// returned session is the only handle to them.
    pub fn start(
        config: &Config,
        window: Arc<dyn HostWindow>,
        page: Option<Box<dyn PageApi>>,
        permission_prompt: Box<dyn RemediationPrompt + Sync>,
        update_prompt: Box<dyn UpdatePrompt + Sync>,
    ) -> Session {
        let (raw_tx, raw_rx) = mpsc::channel(64);
        let (commands_tx, commands_rx) = mpsc::channel(16);
        let (events_tx, events_rx) = mpsc::channel(64);
        let (notify_tx, notify_rx) = mpsc::channel(16);
        let (stop_tx, stop_rx) = watch::channel(());

        let settings = SettingsStore::new();
        settings.subscribe(|name| Appearance::from_theme_name(name).apply());

        let adapter = PageAdapter::new(page, config.volume_ducking);
        task::spawn(adapter.run(raw_rx, commands_rx, events_tx, stop_rx.clone()));

        let router = EventRouter::new(notify_tx, settings.clone(), config.notifications);
        task::spawn(router.run(events_rx, stop_rx.clone()));

        let notifier = Notifier::new(commands_tx.clone(), window);
        task::spawn(notifier.run(notify_rx, stop_rx));

        let keys_tx = spawn_keys_worker(commands_tx.clone());
        if config.media_keys {
            let keys_tx = keys_tx.clone();
            task::spawn(async move {
                match permission::resolve(&SystemProbe, permission_prompt.as_ref()).await {
                    PermissionState::Granted => {
                        let _ = keys_tx.send(KeysRequest::Register);
                    }
                    state => warn!("Media keys stay unregistered: permission {state:?}"),
                }
            });
        }

        if config.check_updates {
            task::spawn(async move {
                update::check(env!("CARGO_PKG_VERSION"), update_prompt.as_ref()).await;
            });
        }

        Session {
            raw_tx,
            commands_tx,
            keys_tx,
            stop_tx,
            settings,
        }
    }

    pub fn raw_events(&self) -> mpsc::Sender<PageEnvelope> {
        self.raw_tx.clone()
    }

    pub fn commands(&self) -> mpsc::Sender<PlayerCommand> {
        self.commands_tx.clone()
    }

    pub fn settings(&self) -> SettingsStore {
        self.settings.clone()
    }

    /// Releases the media keys and stops every task. Safe to call twice.
    pub fn shutdown(&self) {
        let _ = self.keys_tx.send(KeysRequest::Shutdown);
        let _ = self.stop_tx.send(());
        info!("Session shut down");
    }
}

/// The media control session is not `Send`, so a dedicated thread owns it
/// and everything else talks to it through a request channel.
fn spawn_keys_worker(
    commands_tx: mpsc::Sender<PlayerCommand>,
) -> std::sync::mpsc::Sender<KeysRequest> {
    let (keys_tx, keys_rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let mut keys = MediaKeys::new(Box::new(SouvlakiSurface::new(commands_tx)));
        while let Ok(request) = keys_rx.recv() {
            match request {
                KeysRequest::Register => {
                    let outcome = keys.register();
                    let registered = outcome.values().filter(|ok| **ok).count();
                    info!("Media keys registered: {registered}/{}", outcome.len());
                }
                KeysRequest::Shutdown => {
                    keys.unregister_all();
                    break;
                }
            }
        }
    });
    keys_tx
}
