// bevy viewer around the generator
pub mod network;
pub mod ui;
