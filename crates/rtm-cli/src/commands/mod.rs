pub mod audit;
pub mod create;
pub mod delete;
pub mod delete_project;
pub mod dispatch;
pub mod export;
pub mod import;
pub mod list;
pub mod next_key;
pub mod projects;
pub mod schema;
pub mod shared;
pub mod show;
pub mod status;
pub mod update;
