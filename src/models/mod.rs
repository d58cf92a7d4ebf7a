pub mod telemetry;

pub use telemetry::{
    CollectionResult, CycleRecord, Endpoint, RawResult, RetryPolicy, TelemetryCommand,
};
