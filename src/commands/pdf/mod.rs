//! Text pipeline: page text -> normalized stream -> pattern-segmented
//! units -> leveled markdown.

mod normalize;
mod outline;
mod page_extract;
mod render;
mod run;
mod segment;

pub use run::run;
