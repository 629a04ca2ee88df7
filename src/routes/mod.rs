pub mod admin;
pub mod goals;
pub mod health;
pub mod holdings;
pub mod prices;
pub mod users;
