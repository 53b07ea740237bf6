pub mod heater_log;

pub use heater_log::{HeaterLogRepository, SqliteHeaterLogRepository};
