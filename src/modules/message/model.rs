use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone)]
pub struct InsertMessage {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ThreadQuery {
    pub friend_id: Uuid,
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageBody {
    pub receiver_id: Uuid,
    #[validate(length(min = 1, message = "Content cannot be empty"))]
    pub content: String,
}
