pub mod config;
pub mod note_name;
pub mod song;
