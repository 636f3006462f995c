//! Ensemble Engine — scripted group conversations with a social simulation.
//!
//! Authored day scripts are applied event by event to a [`Group`], which
//! tracks who is present, how each member feels about the others, an
//! overall tension level, and the dominant mood. Any character can be handed
//! to an automated or human delegate mid-day, in which case its lines come
//! from a [`Generator`] or a [`Chooser`] instead of the script.
//!
//! [`Group`]: core::group::Group
//! [`Generator`]: core::generator::Generator
//! [`Chooser`]: core::chooser::Chooser

pub mod core;
pub mod schema;
