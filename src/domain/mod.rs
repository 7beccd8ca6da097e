// Domain layer: inventory and report models plus the ports the pipeline depends on.

pub mod model;
pub mod ports;
