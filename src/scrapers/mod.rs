//! Site-specific knowledge: DOM shape, search and sort steps.
//!
//! Only one site is supported:
//!
//! | Source | Module | Method |
//! |--------|--------|--------|
//! | Los Angeles Times | [`latimes`] | Browser automation plus HTML snapshot parsing |

pub mod latimes;
