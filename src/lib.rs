pub mod analytics;
pub mod backend;
pub mod database;
pub mod forecast;
pub mod util;
