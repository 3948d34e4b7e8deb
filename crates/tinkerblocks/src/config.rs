use std::time::Duration;

/// Process-wide engine configuration.
///
/// All fields have working defaults; hosts override the ones they care about
/// with the chained setters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    /// Base URL of the car's HTTP RPC surface.
    pub car_api_url: String,
    /// Per-call timeout for the HTTP client.
    pub car_api_timeout: Duration,
    /// Expected board dimensions. The parser accepts any rectangular grid;
    /// these are defaults for hosts that pre-allocate.
    pub grid_rows: usize,
    pub grid_cols: usize,
    /// Real-world centimetres per logical grid unit.
    pub scale_cm_per_unit: f64,
    /// Step budget for one execution. Exceeding it is a fatal runtime error.
    pub max_steps: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            car_api_url: "http://192.168.1.100".to_string(),
            car_api_timeout: Duration::from_secs(15),
            grid_rows: 16,
            grid_cols: 10,
            scale_cm_per_unit: 10.0,
            max_steps: 10_000,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL of the car API.
    #[must_use]
    pub fn car_api_url(mut self, url: impl Into<String>) -> Self {
        self.car_api_url = url.into();
        self
    }

    /// Sets the per-call timeout of the car API client.
    #[must_use]
    pub fn car_api_timeout(mut self, timeout: Duration) -> Self {
        self.car_api_timeout = timeout;
        self
    }

    /// Sets the expected board dimensions.
    #[must_use]
    pub fn grid_dimensions(mut self, rows: usize, cols: usize) -> Self {
        self.grid_rows = rows;
        self.grid_cols = cols;
        self
    }

    /// Sets the logical-to-real scale factor in centimetres per unit.
    #[must_use]
    pub fn scale_cm_per_unit(mut self, scale: f64) -> Self {
        self.scale_cm_per_unit = scale;
        self
    }

    /// Sets the step budget for one execution.
    #[must_use]
    pub fn max_steps(mut self, limit: u64) -> Self {
        self.max_steps = limit;
        self
    }
}
