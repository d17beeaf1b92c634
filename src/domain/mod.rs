// Domain layer: the entity model shared by every stage, and the ports
// (interfaces) the pipeline is wired through.

pub mod model;
pub mod ports;
