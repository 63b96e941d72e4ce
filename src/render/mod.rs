pub mod accumulator;
pub mod collector;
pub mod compositor;
pub mod device;
pub mod dispatch;
pub mod invalidation;
pub mod kernel;
pub mod lifecycle;
pub mod settings;
pub mod software;
pub mod tracer;
