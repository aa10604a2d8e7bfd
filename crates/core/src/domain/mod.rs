pub mod ooo;
pub mod participant;
pub mod prompt;
pub mod submission;
pub mod timezone;
pub mod work_item;
