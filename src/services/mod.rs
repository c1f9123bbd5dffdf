pub mod actor;
pub mod auth;
pub mod authz;
pub mod expense_store;
pub mod expenses;
pub mod preferences;
