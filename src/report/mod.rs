pub mod html;
pub mod pdf;
pub mod plots;
pub mod table;
pub mod zip;
