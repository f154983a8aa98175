pub mod diff;
pub mod repository;
pub mod worktree;

pub use diff::DiffResult;
pub use repository::Repository;
pub use worktree::WorktreeRecord;
