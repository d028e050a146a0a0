pub mod calibration;
pub mod fingerprint;
pub mod forecast;
pub mod forecast_yaml;
pub mod lateral_optimizer;
pub mod projection;
pub mod projection_plot;
pub mod proration;
pub mod rate_resolution;
