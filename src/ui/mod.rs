pub mod autocomplete;
pub mod boot;
pub mod chat_loop;
pub mod editor;
pub mod theme;
pub mod transcript;
