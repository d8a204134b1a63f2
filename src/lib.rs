pub mod act;
pub mod acts;
pub mod app;
pub mod audio;
pub mod camera;
pub mod config;
pub mod easing;
pub mod layout;
pub mod orchestrator;
pub mod sim;
pub mod smoothing;
pub mod terminal;
pub mod timing;
