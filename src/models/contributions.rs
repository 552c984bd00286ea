//! Contribution statistics DTOs.
//!
//! - `ContributionStats`: file path → author name → `AuthorStats`
//! - `AuthorStats`: line counts plus share of the file's total churn
//!
//! For a text file the percentages across authors sum to 100 whenever any
//! lines were modified at all. A binary file carries exactly one owner entry
//! with zero counts and percentage 100.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type ContributionStats = HashMap<String, HashMap<String, AuthorStats>>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuthorStats {
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub percentage: f64,
}
