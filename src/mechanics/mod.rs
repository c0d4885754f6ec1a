pub mod control;
pub mod energy;
pub mod stoch;

pub use control::*;
pub use energy::*;
pub use stoch::*;
