pub mod apply;
pub mod batch;
pub mod chooser;
pub mod config;
pub mod context;
pub mod delegate;
pub mod generator;
pub mod group;
pub mod markov;
pub mod playback;
pub mod transcript;
