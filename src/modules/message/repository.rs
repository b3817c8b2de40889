use uuid::Uuid;

use crate::modules::message::model::InsertMessage;
use crate::{api::error, modules::message::schema::MessageEntity};

#[async_trait::async_trait]
pub trait MessageRepository {
    async fn create(&self, message: &InsertMessage) -> Result<MessageEntity, error::SystemError>;

    /// Returns the most recent `limit` messages between the two users in
    /// ascending order, then marks every unread message from `friend_id` to
    /// `user_id` as read. Returned rows keep their pre-fetch read state.
    async fn find_thread_and_mark_read(
        &self,
        user_id: &Uuid,
        friend_id: &Uuid,
        limit: i64,
    ) -> Result<Vec<MessageEntity>, error::SystemError>;
}
