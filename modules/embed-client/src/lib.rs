pub mod limits;
pub mod openai;
pub mod traits;

pub use limits::{RateLimitError, RateLimiter, RateLimits};
pub use openai::OpenAi;
pub use traits::EmbedAgent;
