// Domain layer: typed records, the pure analysis stages and the ports (interfaces).
// No I/O happens here.

pub mod model;
pub mod ports;

pub mod services;
