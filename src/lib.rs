pub mod book;
pub mod cli_args;
pub mod error;
mod extractor;
mod middleware;
pub mod repository;
pub mod route;
pub mod schema;
pub mod server;
pub mod state;

#[cfg(test)]
mod test;
