pub mod calibration;
pub mod class_size;
pub mod enrollment;
pub mod grade;
pub mod optimization;
pub mod overrides;
pub mod projection;
pub mod rates;
pub mod rounding;
pub mod scenario;
