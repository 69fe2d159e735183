//! Domain model for judging submissions and ranking contests.

pub mod domain;
