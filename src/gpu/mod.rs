pub mod buffers;
pub mod context;
pub mod device;
pub mod pipeline;
