pub mod http;
pub mod websocket;

pub use http::ReqwestHttp;
pub use websocket::{WebSocketChannel, WebSocketConnector};
