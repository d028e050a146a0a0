pub mod base_commands;
pub mod calibrate_cmd;
pub mod completions_cmd;
pub mod optimize_cmd;
pub mod project_cmd;
pub mod rates_cmd;
pub mod report_format;
