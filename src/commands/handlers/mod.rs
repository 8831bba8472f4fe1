pub mod account;
pub mod friends;
pub mod misc;
pub mod radio;
