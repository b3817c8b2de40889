use actix_web::web::{self, ServiceConfig, scope};

use crate::modules::{
    friend::{handle::*, repository::FriendRepo},
    user::repository::UserRepository,
};

pub fn configure<R, U>(cfg: &mut ServiceConfig)
where
    R: FriendRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    cfg.service(
        scope("/friends")
            .route("/list", web::get().to(list_friends::<R, U>))
            .route("/search", web::get().to(search_users::<R, U>))
            .route("/requests", web::get().to(list_friend_requests::<R, U>))
            .route("/request", web::post().to(send_friend_request::<R, U>))
            .route("/accept", web::post().to(accept_friend_request::<R, U>))
            .route("/reject", web::post().to(reject_friend_request::<R, U>)),
    );
}
