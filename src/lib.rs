#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

pub mod bootstrap;
