use serde::{Deserialize, Serialize};

/// Weather and air quality for one resolved location.
///
/// Replaced wholesale on every successful lookup; `None` fields render as
/// placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_name: String,
    pub temperature_c: Option<f64>,
    pub sky_condition: Option<String>,
    pub precipitation_probability_pct: Option<f64>,
    pub precipitation_1h_mm: Option<f64>,
    pub pm25: Option<f64>,
}

/// One autocomplete candidate, in the order the region service ranked it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSuggestion {
    pub name: String,
    #[serde(rename = "regId")]
    pub region_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowState {
    Open,
    Closed,
    Opening,
    Closing,
    Stopped,
}

impl WindowState {
    pub fn label(&self) -> &'static str {
        match self {
            WindowState::Open => "열림",
            WindowState::Closed => "닫힘",
            WindowState::Opening => "열리는 중",
            WindowState::Closing => "닫히는 중",
            WindowState::Stopped => "정지됨",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub state: WindowState,
    #[serde(rename = "autoClosedByRain", default)]
    pub auto_closed_by_rain: bool,
    #[serde(rename = "rain", default)]
    pub rain_level: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowAction {
    Open,
    Close,
    Stop,
}

impl WindowAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowAction::Open => "open",
            WindowAction::Close => "close",
            WindowAction::Stop => "stop",
        }
    }

    /// Name used in activity log lines.
    pub fn label(&self) -> &'static str {
        match self {
            WindowAction::Open => "창문 열기",
            WindowAction::Close => "창문 닫기",
            WindowAction::Stop => "창문 정지",
        }
    }

    /// Button caption.
    pub fn caption(&self) -> &'static str {
        match self {
            WindowAction::Open => "열기",
            WindowAction::Close => "닫기",
            WindowAction::Stop => "정지",
        }
    }

    /// Button order on the panel.
    pub const fn all() -> &'static [WindowAction] {
        &[WindowAction::Open, WindowAction::Stop, WindowAction::Close]
    }
}

impl std::fmt::Display for WindowAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for WindowAction {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_lowercase();

        match lower.as_str() {
            "open" => Ok(WindowAction::Open),
            "close" => Ok(WindowAction::Close),
            "stop" => Ok(WindowAction::Stop),
            _ => Err(anyhow::anyhow!(
                "Unknown action '{value}'. Supported actions: open, close, stop."
            )),
        }
    }
}

/// Body returned by the device for a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandReply {
    pub ok: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    /// Wall-clock time, `HH:MM:SS`.
    pub time: String,
    pub message: String,
    pub level: LogLevel,
}
