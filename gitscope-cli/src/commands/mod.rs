//! CLI command implementations

pub mod describe;
pub mod worktree;

pub use describe::DescribeArgs;
pub use worktree::WorktreeArgs;
