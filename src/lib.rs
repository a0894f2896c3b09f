pub use augment::{AugmentError, AugmentOptions, Augmentor};
pub use dataset::{Dataset, DatasetError};
pub use table::{Table, TableError};

mod augment;
mod dataset;
#[cfg(test)]
mod functions;
mod table;
