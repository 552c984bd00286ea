pub mod cli;
pub mod contributions;
pub mod repository;
pub mod tree;
pub mod workspace;

pub use repository::WorkingCopy;
