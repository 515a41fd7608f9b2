#![doc = include_str!("../README.md")]

pub mod clock;
pub mod config;
pub mod content;
pub mod date;
pub mod dom;
pub mod enhance;
pub mod fetch;
pub mod highlight;
pub mod html;
pub mod listing;
pub mod permalink;
mod post_view;
pub mod render;
pub mod route;
mod site;
pub mod timer;

pub use config::*;
pub use post_view::*;
pub use site::*;
