pub mod audit;
pub mod catalog;
pub mod config;
pub mod dates;
pub mod inspector;
pub mod paths;
pub mod queue;
pub mod report;
pub mod select;
pub mod sync;
pub mod template;
pub mod util;
pub mod version;
