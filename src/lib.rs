//! Gemini-backed image and video generation: six tasks (edit, text-to-image,
//! virtual try-on, character consistency, scene compositing, text-to-video)
//! behind one request builder, one client trait and a job poller for the
//! long-running video task.

pub mod codec;
pub mod config;
pub mod controller;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;
pub mod poller;
pub mod prompt;
pub mod storage;

pub use codec::{ResourceGuard, ResourceRegistry};
pub use config::{ModelConfig, PollConfig, StudioConfig};
pub use controller::{validate_inputs, FeatureController, FeatureOutput, Studio};
pub use error::{Result, StudioError};
pub use gemini::{GeminiClient, GenerationClient};
pub use models::*;
pub use poller::{cancel_pair, CancelHandle, CancelSignal, JobPoller};
pub use prompt::RequestBuilder;
pub use storage::{ClientContext, Credential, CredentialStore};
