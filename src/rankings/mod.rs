mod load;
mod rank;
mod record;

pub(crate) use load::*;
pub(crate) use rank::*;
pub use record::{RankedLevel, RankedRecord};
