mod analyze;
mod health;
mod meals;
mod metrics;
mod push;

pub use analyze::analyze_handler;
pub use health::health_handler;
pub use meals::meals_handler;
pub use metrics::metrics_handler;
pub use push::{
    check_reminders_handler, push_info_handler, send_push_handler, subscribe_handler,
    unsubscribe_handler,
};
