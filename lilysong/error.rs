use flexi_logger::FlexiLoggerError;
use reqwest::Error as ReqwestError;
use std::io::Error as IoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum App {
    #[error("HTTP request failed")]
    HttpRequest(#[from] ReqwestError),
    #[error("I/O operation failed")]
    Io(#[from] IoError),
    #[error("JSON parsing error")]
    Json(#[from] serde_json::Error),
    #[error("Config parsing error")]
    Config(#[from] toml::de::Error),
    #[error("Logger setup error")]
    Logger(#[from] FlexiLoggerError),
    #[error("Environment variable error")]
    EnvVar(#[from] std::env::VarError),
    #[error("Notification error")]
    Notification(#[from] notify_rust::error::Error),
    #[error("Media key surface error: {0}")]
    MediaKeys(String),
    #[error("Channel closed: {0}")]
    ChannelClosed(String),
    #[cfg(feature = "shell")]
    #[error("Webview error")]
    Webview(#[from] wry::Error),
    #[cfg(feature = "shell")]
    #[error("Window system error")]
    WindowSystem(#[from] tao::error::OsError),
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for App {
    fn from(e: tokio::sync::mpsc::error::SendError<T>) -> Self {
        App::ChannelClosed(e.to_string())
    }
}
