mod sync;

pub use sync::*;
