pub mod error;
pub mod expense_repo;
pub mod preference_repo;
pub mod user_repo;
