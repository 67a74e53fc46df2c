// Accounts: signup/login, password hashing, bearer tokens and the user store.

pub mod handlers;
pub mod middleware;
pub mod password;
pub mod store;
pub mod token;
