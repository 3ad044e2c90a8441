pub mod background;
pub mod health;
pub mod photo;
