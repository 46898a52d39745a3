pub mod advice;
pub mod config;
pub mod history;
pub mod run;
pub mod settings;
pub mod stats;
pub mod task;
pub mod timer;
