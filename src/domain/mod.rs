mod account;
mod budget;
mod goal;
mod money;
mod oneoff;
mod owner;
mod transaction;

pub use account::*;
pub use budget::*;
pub use goal::*;
pub use money::*;
pub use oneoff::*;
pub use owner::*;
pub use transaction::*;
