//! Response grid: permission gate and grid view model.

pub mod model;
pub mod permission;
