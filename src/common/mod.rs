mod fs;
mod hash;
mod xml;

pub(crate) use fs::*;
pub(crate) use hash::*;
pub(crate) use xml::*;
