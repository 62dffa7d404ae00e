pub mod command;
pub mod criteria;
pub mod expression;
pub mod metadata;
pub mod types;
pub mod visitor;

pub use command::*;
pub use criteria::*;
pub use expression::*;
pub use metadata::*;
pub use types::*;
pub use visitor::*;
