pub use super::plants::Entity as Plants;
pub use super::push_subscriptions::Entity as PushSubscriptions;
pub use super::users::Entity as Users;
pub use super::waterings::Entity as Waterings;
