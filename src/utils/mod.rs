pub mod ascii;
pub mod emoji;
pub mod input;
