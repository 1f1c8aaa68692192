// Adapters layer: concrete implementations of the domain ports.

pub mod http;
pub mod mock;
pub mod storage;

pub use http::{ChatCompletionsClient, HttpPageLoader};
pub use mock::{MockLlm, MockReply, StaticPageLoader};
pub use storage::LocalStorage;
