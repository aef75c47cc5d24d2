use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;

use crate::{
    DeviceError,
    model::{CommandReply, DeviceStatus, WindowAction},
};

use super::{DeviceLink, normalize_base, truncate_body};

/// HTTP client for the ESP32 window actuator (`/command`, `/status`).
#[derive(Debug, Clone)]
pub struct Esp32Device {
    base: String,
    http: Client,
}

#[derive(Debug, Serialize)]
struct CommandBody {
    action: WindowAction,
}

impl Esp32Device {
    pub fn new(base: &str, http: Client) -> anyhow::Result<Self> {
        Ok(Self {
            base: normalize_base(base)?,
            http,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

#[async_trait]
impl DeviceLink for Esp32Device {
    async fn send_command(&self, action: WindowAction) -> Result<CommandReply, DeviceError> {
        let res = self
            .http
            .post(self.endpoint("/command"))
            .json(&CommandBody { action })
            .send()
            .await
            .map_err(|e| DeviceError::Unreachable(e.to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| DeviceError::Unreachable(e.to_string()))?;

        interpret_command(status, &body)
    }

    async fn fetch_status(&self) -> Result<DeviceStatus, DeviceError> {
        let res = self
            .http
            .get(self.endpoint("/status"))
            .send()
            .await
            .map_err(|e| DeviceError::Unreachable(e.to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| DeviceError::Unreachable(e.to_string()))?;

        interpret_status(status, &body)
    }
}

/// Any 2xx reply means the device took the command, whatever its `ok` flag.
pub(crate) fn interpret_command(
    status: StatusCode,
    body: &str,
) -> Result<CommandReply, DeviceError> {
    if !status.is_success() {
        return Err(DeviceError::CommandFailed(status.as_u16()));
    }

    serde_json::from_str(body).map_err(|_| DeviceError::InvalidResponse(truncate_body(body)))
}

pub(crate) fn interpret_status(
    status: StatusCode,
    body: &str,
) -> Result<DeviceStatus, DeviceError> {
    if !status.is_success() {
        return Err(DeviceError::StatusFailed(status.as_u16()));
    }

    serde_json::from_str(body).map_err(|_| DeviceError::InvalidResponse(truncate_body(body)))
}
