pub mod add;
pub mod calendar;
pub mod delete;
pub mod edit;
pub mod export;
pub mod import;
pub mod init;
pub mod labels;
pub mod lifecycle;
pub mod list;
pub mod parse;
pub mod show;
