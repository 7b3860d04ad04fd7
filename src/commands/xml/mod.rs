//! Tree pipeline: eCFR XML divisions -> leveled markdown, tracking the
//! ancestor headings currently open.

mod element;
mod inline;
mod run;
#[cfg(test)]
mod tests;
mod walker;

pub use run::run;
