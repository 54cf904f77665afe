//! Template instantiation: placeholder substitution and merging

mod merge;
mod walker;

pub use merge::{merge, MergeError};
pub use walker::{PlaceholderBinding, Substitution, SubstitutionReport};
