pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod security;

pub use error::BookswapError;
pub use router::{BookswapState, bookswap_router};
