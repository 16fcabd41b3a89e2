pub mod action;
pub mod directive;
pub mod ending;
pub mod exposure;
pub mod metrics;
pub mod neighborhood;
pub mod news;
pub mod operator;
pub mod outcome;
pub mod protest;
pub mod subject;
pub mod time;
