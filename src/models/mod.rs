//! Data transfer objects (DTOs) for API responses.
//!
//! These structs are serialized to JSON for API consumers.
//! - `contributions`: AuthorStats, ContributionStats nested mapping
//! - `tree`: TreeNode, TreeResponse, BranchInfo, CurrentBranch
//! - `repository`: RepoRecord, RegisterRepository

pub mod contributions;
pub mod repository;
pub mod tree;

pub use contributions::*;
pub use repository::*;
pub use tree::*;
