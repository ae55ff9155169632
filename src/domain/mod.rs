mod balance;
mod expense;
mod group;
mod money;
mod settlement;
mod split;
mod student;

pub use balance::*;
pub use expense::*;
pub use group::*;
pub use money::*;
pub use settlement::*;
pub use split::*;
pub use student::*;
