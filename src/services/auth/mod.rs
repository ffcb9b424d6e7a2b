pub mod jwt;
pub mod password;
pub mod token_provider;

pub use token_provider::TokenProvider;
