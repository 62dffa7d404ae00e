pub mod capabilities; // Per-backend pushdown capability descriptors
pub mod connector; // Connection facades (loopback, delimited file)
pub mod execution; // Pull-based execution contract
pub mod translator; // Dialect rewrite engine and SQL rendering

pub use capabilities::*;
pub use connector::*;
pub use execution::*;
pub use translator::*;
