use actix_web::{HttpRequest, web};

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::{
        friend::repository::FriendshipRepository,
        message::{
            model::{SendMessageBody, ThreadQuery},
            repository::MessageRepository,
            schema::MessageEntity,
            service::MessageService,
        },
    },
    utils::{ValidatedJson, ValidatedQuery},
};

pub async fn get_messages<M, F>(
    message_service: web::Data<MessageService<M, F>>,
    query: ValidatedQuery<ThreadQuery>,
    req: HttpRequest,
) -> Result<success::Success<Vec<MessageEntity>>, error::Error>
where
    M: MessageRepository + Send + Sync + 'static,
    F: FriendshipRepository + Send + Sync + 'static,
{
    let user_id = get_claims(&req)?.sub;
    let ThreadQuery { friend_id, limit } = query.0;
    let messages = message_service.get_thread(user_id, friend_id, limit).await?;

    Ok(success::Success::ok(Some(messages)).message("Messages retrieved successfully"))
}

pub async fn send_message<M, F>(
    message_service: web::Data<MessageService<M, F>>,
    body: ValidatedJson<SendMessageBody>,
    req: HttpRequest,
) -> Result<success::Success<MessageEntity>, error::Error>
where
    M: MessageRepository + Send + Sync + 'static,
    F: FriendshipRepository + Send + Sync + 'static,
{
    let sender_id = get_claims(&req)?.sub;
    let message =
        message_service.send_message(sender_id, body.0.receiver_id, &body.0.content).await?;

    Ok(success::Success::created(Some(message)).message("Message sent successfully"))
}
