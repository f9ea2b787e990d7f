pub mod prelude;

pub mod plants;
pub mod push_subscriptions;
pub mod users;
pub mod waterings;
