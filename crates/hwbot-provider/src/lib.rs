pub mod practicum;
pub mod status;
pub mod validate;

use async_trait::async_trait;
use hwbot_schema::HomeworkError;
use serde_json::Value;

pub use practicum::{PracticumClient, PRACTICUM_ENDPOINT};
pub use status::parse_status;
pub use validate::{check_response, current_date};

/// Source of raw homework API answers.
#[async_trait]
pub trait HomeworkApi: Send + Sync {
    async fn fetch(&self, from_date: i64) -> Result<Value, HomeworkError>;
}
