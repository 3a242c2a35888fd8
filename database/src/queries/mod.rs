//! Database query modules, one per table

pub mod activity_logs;
pub mod applications;
pub mod gallery;
pub mod jobs;
pub mod messages;
pub mod notifications;
pub mod settings;
pub mod staff;

pub use activity_logs::*;
pub use applications::*;
pub use gallery::*;
pub use jobs::*;
pub use messages::*;
pub use notifications::*;
pub use settings::*;
pub use staff::*;
