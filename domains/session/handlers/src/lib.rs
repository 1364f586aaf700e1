pub mod outcome;
pub mod ports;
pub mod session;

pub use outcome::{ActionReport, Outcome};
pub use ports::{Channel, ChannelConnector, HttpPort};
pub use session::{SessionState, SyntheticSession};
