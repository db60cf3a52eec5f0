pub mod catalog_file;
pub mod notifier;

pub use catalog_file::load_catalog;
pub use notifier::LogNotificationAdapter;
