use actix_web::{HttpRequest, web};

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::{
        friend::{
            model::{
                FriendRequestBody, FriendRequestResponse, FriendRequestsResponse, FriendResponse,
                RespondRequestBody, SearchQuery, SearchUserResponse,
            },
            repository::FriendRepo,
            service::FriendService,
        },
        user::repository::UserRepository,
    },
    utils::{ValidatedJson, ValidatedQuery},
};

pub async fn list_friends<R, U>(
    friend_service: web::Data<FriendService<R, U>>,
    req: HttpRequest,
) -> Result<success::Success<Vec<FriendResponse>>, error::Error>
where
    R: FriendRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let user_id = get_claims(&req)?.sub;
    let friends = friend_service.get_friends(user_id).await?;

    Ok(success::Success::ok(Some(friends)).message("Friends retrieved successfully"))
}

pub async fn search_users<R, U>(
    friend_service: web::Data<FriendService<R, U>>,
    query: ValidatedQuery<SearchQuery>,
    req: HttpRequest,
) -> Result<success::Success<Vec<SearchUserResponse>>, error::Error>
where
    R: FriendRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let user_id = get_claims(&req)?.sub;
    let users = friend_service.search_users(user_id, &query.0.q).await?;

    Ok(success::Success::ok(Some(users)).message("Users retrieved successfully"))
}

pub async fn list_friend_requests<R, U>(
    friend_service: web::Data<FriendService<R, U>>,
    req: HttpRequest,
) -> Result<success::Success<FriendRequestsResponse>, error::Error>
where
    R: FriendRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let user_id = get_claims(&req)?.sub;
    let requests = friend_service.get_friend_requests(user_id).await?;

    Ok(success::Success::ok(Some(requests)).message("Friend requests retrieved successfully"))
}

pub async fn send_friend_request<R, U>(
    friend_service: web::Data<FriendService<R, U>>,
    body: ValidatedJson<FriendRequestBody>,
    req: HttpRequest,
) -> Result<success::Success<FriendRequestResponse>, error::Error>
where
    R: FriendRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let sender_id = get_claims(&req)?.sub;
    let request = friend_service.send_friend_request(sender_id, body.0.receiver_id).await?;

    Ok(success::Success::created(Some(request)).message("Friend request sent successfully"))
}

pub async fn accept_friend_request<R, U>(
    friend_service: web::Data<FriendService<R, U>>,
    body: ValidatedJson<RespondRequestBody>,
    req: HttpRequest,
) -> Result<success::Success<FriendResponse>, error::Error>
where
    R: FriendRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let receiver_id = get_claims(&req)?.sub;
    let friend = friend_service.accept_friend_request(receiver_id, body.0.request_id).await?;

    Ok(success::Success::ok(Some(friend)).message("Friend request accepted successfully"))
}

pub async fn reject_friend_request<R, U>(
    friend_service: web::Data<FriendService<R, U>>,
    body: ValidatedJson<RespondRequestBody>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error>
where
    R: FriendRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let receiver_id = get_claims(&req)?.sub;
    friend_service.reject_friend_request(receiver_id, body.0.request_id).await?;

    Ok(success::Success::ok(None).message("Friend request rejected"))
}
