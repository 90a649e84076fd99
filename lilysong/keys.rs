//! Media key registrar: binds the hardware media keys to player commands,
//! best effort per key, and releases everything at shutdown.

use crate::bridge::PlayerCommand;
use crate::error::App;
use log::{info, warn};
use souvlaki::{MediaControlEvent, MediaControls, PlatformConfig};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub const KEY_PLAY_PAUSE: &str = "MediaPlayPause";
pub const KEY_STOP: &str = "MediaStop";
pub const KEY_NEXT: &str = "MediaNextTrack";
pub const KEY_PREVIOUS: &str = "MediaPreviousTrack";

/// The page player has no discrete stop, so the stop key also toggles.
const BINDINGS: [(&str, PlayerCommand); 4] = [
    (KEY_PLAY_PAUSE, PlayerCommand::TogglePause),
    (KEY_STOP, PlayerCommand::TogglePause),
    (KEY_NEXT, PlayerCommand::Next),
    (KEY_PREVIOUS, PlayerCommand::Previous),
];

/// OS surface the registrar binds keys through. Implementations are owned
/// by a single thread and need not be `Send`.
pub trait KeySurface {
    fn bind(&mut self, key: &'static str, command: PlayerCommand) -> Result<(), App>;
    fn clear(&mut self) -> Result<(), App>;
}

pub struct MediaKeys {
    surface: Box<dyn KeySurface>,
    registered: bool,
}

impl MediaKeys {
    pub fn new(surface: Box<dyn KeySurface>) -> Self {
        MediaKeys {
            surface,
            registered: false,
        }
    }

    /// Registers every binding, continuing past individual failures.
    /// Returns the per-key outcome.
    pub fn register(&mut self) -> BTreeMap<&'static str, bool> {
        let mut outcome = BTreeMap::new();
        for (key, command) in BINDINGS {
            match self.surface.bind(key, command) {
                Ok(()) => {
                    info!("Registered {key}");
                    outcome.insert(key, true);
                }
                Err(e) => {
                    warn!("Could not register {key}: {e}");
                    outcome.insert(key, false);
                }
            }
        }
        self.registered = outcome.values().any(|ok| *ok);
        outcome
    }

    /// Releases every binding. Safe to call when nothing is registered,
    /// and a second call is a no-op.
    pub fn unregister_all(&mut self) {
        if !self.registered {
            return;
        }
        self.registered = false;
        match self.surface.clear() {
            Ok(()) => info!("Released media keys"),
            Err(e) => warn!("Could not release media keys: {e}"),
        }
    }
}

/// souvlaki-backed surface. One `MediaControls` session carries all keys;
/// the handler looks the received event up in the binding table and ships
/// the command to the adapter.
pub struct SouvlakiSurface {
    controls: Option<MediaControls>,
    bindings: Arc<Mutex<HashMap<&'static str, PlayerCommand>>>,
    commands_tx: mpsc::Sender<PlayerCommand>,
}

impl SouvlakiSurface {
    pub fn new(commands_tx: mpsc::Sender<PlayerCommand>) -> Self {
        SouvlakiSurface {
            controls: None,
            bindings: Arc::new(Mutex::new(HashMap::new())),
            commands_tx,
        }
    }

    fn ensure_controls(&mut self) -> Result<(), App> {
        if self.controls.is_none() {
            let config = PlatformConfig {
                dbus_name: "lilysong",
                display_name: "Lilysong",
                hwnd: None,
            };
            let mut controls = MediaControls::new(config)
                .map_err(|e| App::MediaKeys(format!("{e:?}")))?;
            let bindings = self.bindings.clone();
            let commands_tx = self.commands_tx.clone();
            controls
                .attach(move |event: MediaControlEvent| {
                    let key = match event {
                        MediaControlEvent::Play
                        | MediaControlEvent::Pause
                        | MediaControlEvent::Toggle => KEY_PLAY_PAUSE,
                        MediaControlEvent::Stop => KEY_STOP,
                        MediaControlEvent::Next => KEY_NEXT,
                        MediaControlEvent::Previous => KEY_PREVIOUS,
                        _ => return,
                    };
                    let command = bindings.lock().unwrap().get(key).copied();
                    if let Some(command) = command {
                        if let Err(e) = commands_tx.try_send(command) {
                            warn!("Dropping {command:?} from media key: {e}");
                        }
                    }
                })
                .map_err(|e| App::MediaKeys(format!("{e:?}")))?;
            self.controls = Some(controls);
        }
        Ok(())
    }
}

impl KeySurface for SouvlakiSurface {
    fn bind(&mut self, key: &'static str, command: PlayerCommand) -> Result<(), App> {
        self.ensure_controls()?;
        self.bindings.lock().unwrap().insert(key, command);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), App> {
        self.bindings.lock().unwrap().clear();
        if let Some(mut controls) = self.controls.take() {
            controls
                .detach()
                .map_err(|e| App::MediaKeys(format!("{e:?}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeSurface {
        refuse: Vec<&'static str>,
        bound: Vec<(&'static str, PlayerCommand)>,
        cleared: usize,
    }

    impl KeySurface for Arc<Mutex<FakeSurface>> {
        fn bind(&mut self, key: &'static str, command: PlayerCommand) -> Result<(), App> {
            let mut surface = self.lock().unwrap();
            if surface.refuse.contains(&key) {
                return Err(App::MediaKeys(format!("{key} is taken")));
            }
            surface.bound.push((key, command));
            Ok(())
        }

        fn clear(&mut self) -> Result<(), App> {
            let mut surface = self.lock().unwrap();
            surface.bound.clear();
            surface.cleared += 1;
            Ok(())
        }
    }

    fn keys_with(refuse: Vec<&'static str>) -> (MediaKeys, Arc<Mutex<FakeSurface>>) {
        let surface = Arc::new(Mutex::new(FakeSurface {
            refuse,
            ..FakeSurface::default()
        }));
        (MediaKeys::new(Box::new(surface.clone())), surface)
    }

    #[test]
    fn all_four_keys_register_with_their_commands() {
        let (mut keys, surface) = keys_with(Vec::new());
        let outcome = keys.register();
        assert!(outcome.values().all(|ok| *ok));
        let bound = surface.lock().unwrap().bound.clone();
        assert_eq!(
            bound,
            vec![
                (KEY_PLAY_PAUSE, PlayerCommand::TogglePause),
                (KEY_STOP, PlayerCommand::TogglePause),
                (KEY_NEXT, PlayerCommand::Next),
                (KEY_PREVIOUS, PlayerCommand::Previous),
            ]
        );
    }

    #[test]
    fn one_refused_key_leaves_the_rest_registered() {
        let (mut keys, _surface) = keys_with(vec![KEY_STOP]);
        let outcome = keys.register();
        assert_eq!(outcome[KEY_STOP], false);
        assert_eq!(outcome.values().filter(|ok| **ok).count(), 3);
    }

    #[test]
    fn unregister_all_is_idempotent() {
        let (mut keys, surface) = keys_with(Vec::new());
        keys.register();
        keys.unregister_all();
        keys.unregister_all();
        assert_eq!(surface.lock().unwrap().cleared, 1);
    }

    #[test]
    fn unregister_without_register_does_nothing() {
        let (mut keys, surface) = keys_with(Vec::new());
        keys.unregister_all();
        assert_eq!(surface.lock().unwrap().cleared, 0);
    }
}
