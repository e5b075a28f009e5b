pub mod charts;
pub mod notice;
pub mod panels;
