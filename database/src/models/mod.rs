// Database models

pub mod activity_log;
pub mod application;
pub mod gallery;
pub mod job;
pub mod message;
pub mod notification;
pub mod setting;
pub mod staff;

pub use activity_log::*;
pub use application::*;
pub use gallery::*;
pub use job::*;
pub use message::*;
pub use notification::*;
pub use setting::*;
pub use staff::*;
