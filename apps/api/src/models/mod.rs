pub mod calendar;
pub mod score;
