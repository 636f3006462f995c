pub mod actor;
pub mod dialogue;
pub mod emotion;
pub mod event;
pub mod relationship;
pub mod roster;
pub mod script;
