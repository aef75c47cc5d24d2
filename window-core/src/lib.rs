//! Core library for the `window` control panel.
//!
//! This crate defines:
//! - Configuration handling
//! - Clients for the weather/region backend and the ESP32 window actuator
//! - The panel state aggregate and the display strings derived from it
//! - The event loop that keeps weather, suggestions and device status in sync
//!
//! It is used by `window-cli`, but the state and display modules do not
//! depend on a terminal and can back other front ends.

pub mod activity;
pub mod config;
pub mod display;
pub mod error;
pub mod model;
pub mod panel;
pub mod provider;
pub mod schedule;
pub mod state;

pub use activity::ActivityLog;
pub use config::{Config, Polling};
pub use display::PanelView;
pub use error::{DeviceError, ServerError};
pub use model::{
    CommandReply, DeviceStatus, LogEntry, LogLevel, RegionSuggestion, WeatherSnapshot, WindowAction,
    WindowState,
};
pub use panel::{Panel, PanelEvent};
pub use provider::{DeviceLink, RegionSearch, Services, WeatherLookup, services_from_config};
pub use state::{DeviceView, PanelState};
