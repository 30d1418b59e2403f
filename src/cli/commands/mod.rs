pub mod analyze;
pub mod check;
pub mod config;
pub mod generate;
pub mod history;
pub mod init;
pub mod lint;
pub mod repos;
pub mod save;
