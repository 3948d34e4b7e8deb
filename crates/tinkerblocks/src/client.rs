//! HTTP RPC client for the physical car, and the [`HardwareInterface`]
//! implementation built on it.
//!
//! The car firmware exposes a small JSON-over-POST surface. Transport
//! errors, non-2xx statuses and `success: false` responses are all folded
//! into a failed [`CarResponse`]; nothing here raises. [`CarHardware`]
//! translates the interpreter's capability calls into RPC requests and
//! applies the documented sensor fallbacks on failure.

use std::time::Duration;

use serde::Serialize;

use crate::{
    config::EngineConfig,
    hardware::{DISTANCE_FALLBACK_CM, HardwareInterface},
};

/// A response from the car API.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct CarResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl CarResponse {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }

    /// The result as a number, accepting numeric strings (some firmware
    /// revisions return sensor readings as strings).
    #[must_use]
    pub fn result_as_f64(&self) -> Option<f64> {
        match &self.result {
            Some(serde_json::Value::Number(n)) => n.as_f64(),
            Some(serde_json::Value::String(s)) => s.parse().ok(),
            _ => None,
        }
    }

    /// The result as a boolean, if it is one.
    #[must_use]
    pub fn result_as_bool(&self) -> Option<bool> {
        match self.result {
            Some(serde_json::Value::Bool(b)) => Some(b),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MoveRequest {
    speed: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_ms: Option<u64>,
    check_ultrasonic: bool,
    enable_yaw_correction: bool,
}

#[derive(Debug, Serialize)]
struct RotateRequest {
    angle: f64,
    speed: i32,
    absolute: bool,
}

#[derive(Debug, Serialize)]
struct PenRequest {
    action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<u8>,
}

#[derive(Debug, Serialize)]
struct SensorRequest {
    action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    threshold: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ActionRequest<'a> {
    action: &'a str,
}

/// Blocking JSON client for the car's RPC endpoints.
#[derive(Debug)]
pub struct CarClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl CarClient {
    /// Builds a client for `base_url` with a per-call timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Builds a client from the engine configuration.
    pub fn from_config(config: &EngineConfig) -> Result<Self, reqwest::Error> {
        Self::new(&config.car_api_url, config.car_api_timeout)
    }

    fn post<B: Serialize>(&self, endpoint: &str, body: &B) -> CarResponse {
        let url = format!("{}{endpoint}", self.base_url);
        log::debug!("POST {url}");
        let response = match self.client.post(&url).json(body).send() {
            Ok(response) => response,
            Err(err) => {
                log::error!("request to {url} failed: {err}");
                let reason = if err.is_timeout() {
                    "connection timeout".to_string()
                } else {
                    format!("connection error: {err}")
                };
                return CarResponse::failure(reason);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            log::error!("{url} returned HTTP {status}: {body}");
            return CarResponse::failure(format!("HTTP {status}: {body}"));
        }

        match response.json::<CarResponse>() {
            Ok(parsed) => parsed,
            Err(err) => {
                log::error!("invalid JSON from {url}: {err}");
                CarResponse::failure(format!("invalid response: {err}"))
            }
        }
    }

    /// `POST /api/move`: drive forward or backward.
    pub fn move_car(
        &self,
        speed: i32,
        distance: Option<f64>,
        time_ms: Option<u64>,
        check_ultrasonic: bool,
        enable_yaw_correction: bool,
    ) -> CarResponse {
        self.post(
            "/api/move",
            &MoveRequest {
                speed,
                distance,
                time_ms,
                check_ultrasonic,
                enable_yaw_correction,
            },
        )
    }

    /// `POST /api/rotate`: rotate by (or to) an angle.
    pub fn rotate(&self, angle: f64, speed: i32, absolute: bool) -> CarResponse {
        self.post(
            "/api/rotate",
            &RotateRequest {
                angle,
                speed,
                absolute,
            },
        )
    }

    /// `POST /api/pen`: raise, lower, or position the pen.
    pub fn pen(&self, action: &'static str, position: Option<u8>) -> CarResponse {
        self.post("/api/pen", &PenRequest { action, position })
    }

    /// `POST /api/sensor`: ultrasonic distance or obstacle check.
    pub fn sensor(&self, action: &'static str, threshold: Option<f64>) -> CarResponse {
        self.post("/api/sensor", &SensorRequest { action, threshold })
    }

    /// `POST /api/ir`: infrared surface sensor.
    pub fn ir(&self, action: &str) -> CarResponse {
        self.post("/api/ir", &ActionRequest { action })
    }

    /// `POST /api/gyro`: gyroscope data, calibration, yaw and reference.
    pub fn gyro(&self, action: &str) -> CarResponse {
        self.post("/api/gyro", &ActionRequest { action })
    }

    /// `POST /api/buzzer`: buzzer on/off.
    pub fn buzzer(&self, action: &str) -> CarResponse {
        self.post("/api/buzzer", &ActionRequest { action })
    }
}

/// Real hardware: relays every capability call to the car's RPC surface.
///
/// Failed calls are logged and reported as `false`; sensor reads fall back
/// to 999 cm distance and `false` booleans so the program keeps running.
#[derive(Debug)]
pub struct CarHardware {
    client: CarClient,
}

impl CarHardware {
    #[must_use]
    pub fn new(client: CarClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(CarClient::from_config(config)?))
    }
}

impl HardwareInterface for CarHardware {
    fn move_distance(&mut self, distance_cm: f64) -> bool {
        let speed = if distance_cm >= 0.0 { 100 } else { -100 };
        let response = self
            .client
            .move_car(speed, Some(distance_cm.abs()), None, true, true);
        if !response.success {
            log::warn!(
                "move of {distance_cm}cm failed: {}",
                response.error.as_deref().unwrap_or("unknown error")
            );
        }
        response.success
    }

    fn rotate_degrees(&mut self, degrees: f64) -> bool {
        let response = self.client.rotate(degrees, 100, false);
        if !response.success {
            log::warn!(
                "rotation of {degrees} degrees failed: {}",
                response.error.as_deref().unwrap_or("unknown error")
            );
        }
        response.success
    }

    fn set_pen_down(&mut self, down: bool) -> bool {
        let action = if down { "down" } else { "up" };
        let response = self.client.pen(action, None);
        if !response.success {
            log::warn!(
                "pen {action} failed: {}",
                response.error.as_deref().unwrap_or("unknown error")
            );
        }
        response.success
    }

    fn distance_cm(&mut self) -> f64 {
        let response = self.client.sensor("distance", None);
        if response.success
            && let Some(distance) = response.result_as_f64()
        {
            return distance;
        }
        log::warn!("distance sensor unavailable, using fallback {DISTANCE_FALLBACK_CM}cm");
        DISTANCE_FALLBACK_CM
    }

    fn is_obstacle_detected(&mut self, threshold_cm: f64) -> bool {
        let response = self.client.sensor("obstacle", Some(threshold_cm));
        if response.success
            && let Some(detected) = response.result_as_bool()
        {
            return detected;
        }
        log::warn!("obstacle sensor unavailable, assuming clear");
        false
    }

    fn is_black_detected(&mut self) -> bool {
        let response = self.client.ir("black_obstacle");
        if response.success
            && let Some(detected) = response.result_as_bool()
        {
            return detected;
        }
        log::warn!("IR sensor unavailable, assuming no black surface");
        false
    }

    fn control_buzzer(&mut self, on: bool) -> bool {
        let action = if on { "on" } else { "off" };
        let response = self.client.buzzer(action);
        if !response.success {
            log::warn!(
                "buzzer {action} failed: {}",
                response.error.as_deref().unwrap_or("unknown error")
            );
        }
        response.success
    }
}
