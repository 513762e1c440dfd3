pub mod account;
pub mod callback;
pub mod tasks;
pub mod watermark;
