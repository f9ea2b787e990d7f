pub mod plant;
pub mod push_subscription;
pub mod user;
pub mod watering;
