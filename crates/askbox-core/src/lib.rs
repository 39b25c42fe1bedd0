pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod input;
pub mod state;

// Re-export main types for convenience
pub use client::{AskClient, Answer};
pub use config::Config;
pub use controller::{ChatController, ControllerSettings, Submission};
pub use error::AskError;
pub use input::InputField;
pub use state::{LoadingIndicator, Message, Phase, Role, Transcript};
