pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginResult, Registration};
pub use auth_service_impl::SeaOrmAuthService;

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{ProfileUpdate, UserError, UserService, UserStats};
pub use user_service_impl::SeaOrmUserService;

pub mod plant_service;
pub mod plant_service_impl;
pub use plant_service::{
    PlantDetail, PlantError, PlantInput, PlantListItem, PlantNeedingWater, PlantService,
    PlantUpdate, UpcomingWatering,
};
pub use plant_service_impl::SeaOrmPlantService;

pub mod watering_service;
pub mod watering_service_impl;
pub use watering_service::{
    DeletedWatering, RecordedWatering, WateringEntry, WateringError, WateringHistory,
    WateringInput, WateringService, WateringStats,
};
pub use watering_service_impl::SeaOrmWateringService;

pub mod notification_service;
pub mod notification_service_impl;
pub use notification_service::{
    DeliveryOutcome, DeliveryReport, NotificationError, NotificationService,
};
pub use notification_service_impl::SeaOrmNotificationService;

pub mod reminders;
pub use reminders::{ReminderService, ScanSummary};

pub mod scheduler;
pub use scheduler::Scheduler;

pub mod system_service;
pub mod system_service_impl;
pub use system_service::{SystemError, SystemService, SystemStatus};
pub use system_service_impl::SeaOrmSystemService;
