use actix_web::web::{self, ServiceConfig, scope};

use crate::modules::{
    friend::repository::FriendshipRepository,
    message::{handle::*, repository::MessageRepository},
};

pub fn configure<M, F>(cfg: &mut ServiceConfig)
where
    M: MessageRepository + Send + Sync + 'static,
    F: FriendshipRepository + Send + Sync + 'static,
{
    cfg.service(
        scope("/chat")
            .route("/messages", web::get().to(get_messages::<M, F>))
            .route("/send", web::post().to(send_message::<M, F>)),
    );
}
