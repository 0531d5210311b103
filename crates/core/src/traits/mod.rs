pub mod diagnostic_sink;
pub mod runnable;

pub use diagnostic_sink::*;
pub use runnable::*;
