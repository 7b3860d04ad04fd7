pub mod inventory;
pub mod pdf;
pub mod xml;
