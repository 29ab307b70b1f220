// Domain layer: message model and the node port.

pub mod model;
pub mod ports;
