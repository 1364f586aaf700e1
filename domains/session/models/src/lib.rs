pub mod action;
pub mod config;
pub mod identity;
pub mod presets;
pub mod request;
pub mod settings;

pub use action::ActionKind;
pub use config::{
    Credentials, Endpoints, KeepaliveConfig, LoginConfig, SessionConfig,
    TaskWeights, Timeouts, WaitTime,
};
pub use identity::{AuthHeaders, AuthIdentity, LoginShape};
pub use request::{ApiRequest, ApiResponse, HttpMethod};
pub use settings::LoadSettings;
