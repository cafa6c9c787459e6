// Domain layer: models, property trees and the host tree port.

pub mod model;
pub mod ports;
