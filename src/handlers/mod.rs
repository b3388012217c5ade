pub mod auth;
pub mod books;
pub mod exchanges;
pub mod families;
pub mod health;
pub mod users;
