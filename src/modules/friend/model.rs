use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::modules::{friend::schema::RequestStatus, user::schema::UserEntity};

/// Public profile of another user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FriendResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

impl From<UserEntity> for FriendResponse {
    fn from(user: UserEntity) -> Self {
        FriendResponse { id: user.id, name: user.name, email: user.email, image: user.image }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdOrInfo {
    Id(Uuid),
    Info(FriendResponse),
}

#[derive(sqlx::FromRow)]
pub struct PendingRequestRow {
    pub req_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub status: RequestStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl PendingRequestRow {
    pub fn profile(&self) -> FriendResponse {
        FriendResponse {
            id: self.user_id,
            name: self.name.clone(),
            email: self.email.clone(),
            image: self.image.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestResponse {
    pub id: Uuid,
    pub sender: IdOrInfo,
    pub receiver: IdOrInfo,
    pub status: RequestStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FriendRequestsResponse {
    pub received: Vec<FriendRequestResponse>,
    pub sent: Vec<FriendRequestResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchUserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub is_friend: bool,
    pub request_sent: bool,
}

impl SearchUserResponse {
    pub fn annotate(user: UserEntity, is_friend: bool, request_sent: bool) -> Self {
        SearchUserResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            image: user.image,
            is_friend,
            request_sent,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestBody {
    pub receiver_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RespondRequestBody {
    pub request_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}
