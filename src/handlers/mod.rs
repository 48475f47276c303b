pub mod health;
pub mod score;
pub mod spin;
pub mod submissions;
