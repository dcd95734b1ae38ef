pub mod agents;
pub mod rebase;
