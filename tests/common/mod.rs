//! Shared test fixtures

mod mock_history;
mod temp_repo;

#[allow(unused_imports)]
pub use mock_history::{MockCommit, MockHistory, RecentCommitCall};
#[allow(unused_imports)]
pub use temp_repo::{TempGitRepo, test_editor};
