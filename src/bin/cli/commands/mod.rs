pub mod del;
pub mod due;
pub mod edit;
pub mod list;
pub mod new;
pub mod show;
pub mod study;
