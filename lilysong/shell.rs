//! Webview shell: the tao window and wry webview hosting the player page,
//! plus the glue between the page script and the session channels.

use crate::bridge::adapter::PageApi;
use crate::bridge::PageEnvelope;
use crate::config::Config;
use crate::error::App;
use crate::permission::DialogPrompt;
use crate::session::Session;
use crate::update::DialogUpdatePrompt;
use crate::window::HostWindow;
use log::{error, warn};
use std::sync::Arc;
use tao::dpi::LogicalSize;
use tao::event::{Event, WindowEvent};
use tao::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use tao::window::WindowBuilder;
use wry::WebViewBuilder;

const PLAYER_URL: &str = "https://music.yandex.ru";
const PAGE_BRIDGE: &str = include_str!("ui/bridge.js");
const PAGE_CSS: &str = include_str!("ui/player.css");

#[derive(Debug, Clone)]
enum UserEvent {
    PageCommand(String),
    ShowWindow,
}

/// Drives the page player by evaluating scripts on the event loop thread.
struct WebviewPage {
    proxy: EventLoopProxy<UserEvent>,
}

impl WebviewPage {
    fn dispatch(&self, script: String) {
        if self.proxy.send_event(UserEvent::PageCommand(script)).is_err() {
            warn!("Dropping page command: event loop is gone");
        }
    }
}

impl PageApi for WebviewPage {
    fn next(&self) {
        self.dispatch("externalAPI.next()".to_string());
    }

    fn previous(&self) {
        self.dispatch("externalAPI.prev()".to_string());
    }

    fn toggle_pause(&self) {
        self.dispatch("externalAPI.togglePause()".to_string());
    }

    fn toggle_like(&self) {
        self.dispatch("externalAPI.toggleLike()".to_string());
    }

    fn set_volume(&self, value: f64) {
        self.dispatch(format!("externalAPI.setVolume({value})"));
    }
}

struct WebviewWindow {
    proxy: EventLoopProxy<UserEvent>,
}

impl HostWindow for WebviewWindow {
    fn bring_to_front(&self) {
        let _ = self.proxy.send_event(UserEvent::ShowWindow);
    }
}

pub fn run(config: Config) -> Result<(), App> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let _guard = runtime.enter();

    let event_loop = EventLoopBuilder::<UserEvent>::with_user_event().build();
    let proxy = event_loop.create_proxy();

    let session = Session::start(
        &config,
        Arc::new(WebviewWindow {
            proxy: proxy.clone(),
        }),
        Some(Box::new(WebviewPage { proxy })),
        Box::new(DialogPrompt),
        Box::new(DialogUpdatePrompt),
    );

    let window = WindowBuilder::new()
        .with_title("Lilysong")
        .with_inner_size(LogicalSize::new(1100.0, 750.0))
        .build(&event_loop)?;

    let init_script = format!(
        "window.__lilyCss = {};\n{}",
        serde_json::to_string(PAGE_CSS)?,
        PAGE_BRIDGE
    );

    let raw_tx = session.raw_events();
    let webview = WebViewBuilder::new()
        .with_url(PLAYER_URL)
        .with_initialization_script(&init_script)
        .with_ipc_handler(move |message| {
            match serde_json::from_str::<PageEnvelope>(message.body()) {
                Ok(envelope) => {
                    if let Err(e) = raw_tx.try_send(envelope) {
                        error!("Page event dropped: {e}");
                    }
                }
                Err(e) => error!("Unreadable page message: {e}"),
            }
        })
        .build(&window)?;

    event_loop.run(move |event, _target, control_flow| {
        *control_flow = ControlFlow::Wait;
        match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                session.shutdown();
                *control_flow = ControlFlow::Exit;
            }
            Event::UserEvent(UserEvent::PageCommand(script)) => {
                if let Err(e) = webview.evaluate_script(&script) {
                    error!("Script evaluation failed: {e}");
                }
            }
            Event::UserEvent(UserEvent::ShowWindow) => {
                window.set_visible(true);
                window.set_focus();
            }
            _ => {}
        }
    });
}
