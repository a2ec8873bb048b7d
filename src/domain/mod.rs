// Domain layer: plate readings, report rows and the ports the pipeline talks through.

pub mod model;
pub mod plate;
pub mod ports;
