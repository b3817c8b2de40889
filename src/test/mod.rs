//! Test doubles and fixtures shared by service, handler and database tests.

use std::collections::HashMap;
use std::future::{Ready, ready};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use actix_web::{
    HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        friend::{
            model::{FriendRequestResponse, FriendResponse, IdOrInfo},
            repository::{FriendRepo, FriendRequestRepository, FriendshipRepository},
            schema::{FriendRequestEntity, FriendshipEntity, RequestStatus, ordered_pair},
        },
        message::{model::InsertMessage, repository::MessageRepository, schema::MessageEntity},
        user::{
            model::InsertUser,
            repository::{SessionStore, UserRepository},
            repository_pg::UserRepositoryPg,
            schema::UserEntity,
        },
    },
    utils::{Claims, TokenSettings},
};

pub fn token_settings() -> TokenSettings {
    TokenSettings {
        secret: "test-secret".to_string(),
        access_expiration: 900,
        refresh_expiration: 3600,
    }
}

/// Inserts a user through the Postgres repository, deriving unique fields from `name`.
pub async fn insert_user(pool: &sqlx::PgPool, name: &str) -> Uuid {
    let handle = name.to_lowercase();
    UserRepositoryPg::new(pool.clone())
        .create(&InsertUser {
            username: handle.clone(),
            name: name.to_string(),
            email: format!("{handle}@example.com"),
            phone: None,
            hash_password: None,
        })
        .await
        .unwrap()
}

#[derive(Default)]
struct State {
    users: Vec<UserEntity>,
    requests: Vec<FriendRequestEntity>,
    friendships: Vec<FriendshipEntity>,
    messages: Vec<MessageEntity>,
    sessions: HashMap<Uuid, Uuid>,
    ticks: i64,
}

impl State {
    /// Strictly increasing timestamps so ordering assertions are deterministic.
    fn now(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        DateTime::from_timestamp(1_700_000_000 + self.ticks, 0).unwrap()
    }

    fn user(&self, id: &Uuid) -> Option<&UserEntity> {
        self.users.iter().find(|u| u.id == *id)
    }

    fn friendship(&self, a: &Uuid, b: &Uuid) -> Option<&FriendshipEntity> {
        let (user1, user2) = ordered_pair(*a, *b);
        self.friendships.iter().find(|f| f.user1_id == user1 && f.user2_id == user2)
    }

    fn insert_friendship(&mut self, a: Uuid, b: Uuid) {
        if self.friendship(&a, &b).is_some() {
            return;
        }
        let (user1_id, user2_id) = ordered_pair(a, b);
        let created_at = self.now();
        let id = Uuid::now_v7();
        self.friendships.push(FriendshipEntity { id, user1_id, user2_id, created_at });
    }

    fn pending_requests(&self, incoming: bool, user_id: &Uuid) -> Vec<FriendRequestResponse> {
        let mut rows: Vec<&FriendRequestEntity> = self
            .requests
            .iter()
            .filter(|r| r.status == RequestStatus::Pending)
            .filter(|r| if incoming { r.receiver_id == *user_id } else { r.sender_id == *user_id })
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        rows.into_iter()
            .filter_map(|r| {
                let other = if incoming { r.sender_id } else { r.receiver_id };
                let profile = IdOrInfo::Info(self.user(&other)?.clone().into());
                let (sender, receiver) = if incoming {
                    (profile, IdOrInfo::Id(*user_id))
                } else {
                    (IdOrInfo::Id(*user_id), profile)
                };
                Some(FriendRequestResponse {
                    id: r.id,
                    sender,
                    receiver,
                    status: r.status,
                    created_at: r.created_at,
                })
            })
            .collect()
    }
}

fn other_member(friendship: &FriendshipEntity, user_id: &Uuid) -> Uuid {
    if friendship.user1_id == *user_id { friendship.user2_id } else { friendship.user1_id }
}

/// Implements every repository trait over shared vectors.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_lookups: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn check_lookups(&self) -> Result<(), error::SystemError> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(error::SystemError::InternalError("lookup unavailable".into()));
        }
        Ok(())
    }

    pub fn add_user(&self, name: &str, email: &str) -> Uuid {
        self.insert_account(name, email, None)
    }

    /// An account created through an OAuth provider: it has a phone but no password.
    pub fn add_oauth_user(&self, name: &str, email: &str, phone: &str) -> Uuid {
        self.insert_account(name, email, Some(phone.to_string()))
    }

    fn insert_account(&self, name: &str, email: &str, phone: Option<String>) -> Uuid {
        let mut state = self.state();
        let now = state.now();
        let id = Uuid::now_v7();
        let username = email.split('@').next().unwrap_or(email).to_string();
        state.users.push(UserEntity {
            id,
            username,
            name: name.to_string(),
            email: email.to_string(),
            phone,
            image: None,
            hash_password: None,
            created_at: now,
            updated_at: now,
        });
        id
    }

    pub fn make_friends(&self, a: Uuid, b: Uuid) {
        self.state().insert_friendship(a, b);
    }

    pub fn are_friends(&self, a: Uuid, b: Uuid) -> bool {
        self.state().friendship(&a, &b).is_some()
    }

    pub fn request(&self, id: Uuid) -> Option<FriendRequestEntity> {
        self.state().requests.iter().find(|r| r.id == id).cloned()
    }

    pub fn request_count(&self) -> usize {
        self.state().requests.len()
    }

    pub fn friendship_count(&self) -> usize {
        self.state().friendships.len()
    }

    pub fn messages(&self) -> Vec<MessageEntity> {
        self.state().messages.clone()
    }

    pub fn message_count(&self) -> usize {
        self.state().messages.len()
    }

    pub fn session_count(&self) -> usize {
        self.state().sessions.len()
    }

    /// Makes the relationship lookups used by search annotation fail.
    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    fn respond(
        &self,
        request_id: &Uuid,
        user_id: &Uuid,
        status: RequestStatus,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let mut state = self.state();
        let now = state.now();

        let request = state
            .requests
            .iter_mut()
            .find(|r| r.id == *request_id)
            .ok_or_else(|| error::SystemError::not_found("Friend request not found"))?;
        request.ensure_respondable(user_id)?;
        request.status = status;
        request.updated_at = now;
        let updated = request.clone();

        if status == RequestStatus::Accepted {
            state.insert_friendship(updated.sender_id, updated.receiver_id);
        }

        Ok(updated)
    }
}

#[async_trait::async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        Ok(self.state().user(id).cloned())
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<UserEntity>, error::SystemError> {
        Ok(self.state().users.iter().find(|u| u.phone.as_deref() == Some(phone)).cloned())
    }

    async fn create(&self, user: &InsertUser) -> Result<Uuid, error::SystemError> {
        let mut state = self.state();
        if state.users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(error::SystemError::conflict("Email already exists"));
        }

        let now = state.now();
        let id = Uuid::now_v7();
        state.users.push(UserEntity {
            id,
            username: user.username.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            image: None,
            hash_password: user.hash_password.clone(),
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn search_users(
        &self,
        query: &str,
        exclude_id: &Uuid,
        limit: i64,
    ) -> Result<Vec<UserEntity>, error::SystemError> {
        let needle = query.to_lowercase();
        let matches = |field: &str| field.to_lowercase().contains(&needle);

        let mut users: Vec<UserEntity> = self
            .state()
            .users
            .iter()
            .filter(|u| u.id != *exclude_id)
            .filter(|u| {
                matches(&u.name)
                    || matches(&u.username)
                    || matches(&u.email)
                    || u.phone.as_deref().is_some_and(matches)
            })
            .cloned()
            .collect();
        users.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id)));
        users.truncate(limit as usize);

        Ok(users)
    }
}

#[async_trait::async_trait]
impl FriendshipRepository for MemoryStore {
    async fn find_friendship(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<Option<FriendshipEntity>, error::SystemError> {
        self.check_lookups()?;
        Ok(self.state().friendship(user_id_a, user_id_b).cloned())
    }

    async fn find_friends(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendResponse>, error::SystemError> {
        let state = self.state();
        let mut friendships: Vec<&FriendshipEntity> = state
            .friendships
            .iter()
            .filter(|f| f.user1_id == *user_id || f.user2_id == *user_id)
            .collect();
        friendships.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        Ok(friendships
            .into_iter()
            .filter_map(|f| state.user(&other_member(f, user_id)).cloned())
            .map(FriendResponse::from)
            .collect())
    }
}

#[async_trait::async_trait]
impl FriendRequestRepository for MemoryStore {
    async fn find_pending_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        self.check_lookups()?;
        Ok(self
            .state()
            .requests
            .iter()
            .find(|r| {
                r.status == RequestStatus::Pending
                    && r.sender_id == *sender_id
                    && r.receiver_id == *receiver_id
            })
            .cloned())
    }

    async fn find_pending_request_between(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        let pair = ordered_pair(*user_id_a, *user_id_b);
        Ok(self
            .state()
            .requests
            .iter()
            .find(|r| {
                r.status == RequestStatus::Pending
                    && ordered_pair(r.sender_id, r.receiver_id) == pair
            })
            .cloned())
    }

    async fn find_pending_requests_to_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestResponse>, error::SystemError> {
        Ok(self.state().pending_requests(true, user_id))
    }

    async fn find_pending_requests_from_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestResponse>, error::SystemError> {
        Ok(self.state().pending_requests(false, user_id))
    }

    async fn create_friend_request(
        &self,
        sender_id: &Uuid,
        receiver_id: &Uuid,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let mut state = self.state();
        let pair = ordered_pair(*sender_id, *receiver_id);
        if state.requests.iter().any(|r| {
            r.status == RequestStatus::Pending && ordered_pair(r.sender_id, r.receiver_id) == pair
        }) {
            return Err(error::SystemError::conflict("Friend request already pending"));
        }

        let now = state.now();
        let request = FriendRequestEntity {
            id: Uuid::now_v7(),
            sender_id: *sender_id,
            receiver_id: *receiver_id,
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        state.requests.push(request.clone());
        Ok(request)
    }
}

#[async_trait::async_trait]
impl FriendRepo for MemoryStore {
    async fn accept_friend_request_atomic(
        &self,
        request_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        self.respond(request_id, user_id, RequestStatus::Accepted)
    }

    async fn reject_friend_request_atomic(
        &self,
        request_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        self.respond(request_id, user_id, RequestStatus::Rejected)
    }
}

#[async_trait::async_trait]
impl MessageRepository for MemoryStore {
    async fn create(&self, message: &InsertMessage) -> Result<MessageEntity, error::SystemError> {
        let mut state = self.state();
        let created_at = state.now();
        let message = MessageEntity {
            id: Uuid::now_v7(),
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            content: message.content.clone(),
            read: false,
            created_at,
        };
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn find_thread_and_mark_read(
        &self,
        user_id: &Uuid,
        friend_id: &Uuid,
        limit: i64,
    ) -> Result<Vec<MessageEntity>, error::SystemError> {
        let mut state = self.state();
        let pair = ordered_pair(*user_id, *friend_id);

        let mut thread: Vec<MessageEntity> = state
            .messages
            .iter()
            .filter(|m| ordered_pair(m.sender_id, m.receiver_id) == pair)
            .cloned()
            .collect();
        thread.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        thread.truncate(limit as usize);
        thread.reverse();

        for message in state.messages.iter_mut() {
            if message.sender_id == *friend_id && message.receiver_id == *user_id {
                message.read = true;
            }
        }

        Ok(thread)
    }
}

#[async_trait::async_trait]
impl SessionStore for MemoryStore {
    async fn save(
        &self,
        jti: &Uuid,
        user_id: &Uuid,
        _ttl_secs: u64,
    ) -> Result<(), error::SystemError> {
        self.state().sessions.insert(*jti, *user_id);
        Ok(())
    }

    async fn revoke(&self, jti: &Uuid) -> Result<bool, error::SystemError> {
        Ok(self.state().sessions.remove(jti).is_some())
    }
}

/// Stands in for the bearer middleware by inserting access claims for a fixed user.
pub struct AsUser(Uuid);

pub fn as_user(user_id: Uuid) -> AsUser {
    AsUser(user_id)
}

impl<S, B> Transform<S, ServiceRequest> for AsUser
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Transform = AsUserMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AsUserMiddleware { service, user_id: self.0 }))
    }
}

pub struct AsUserMiddleware<S> {
    service: S,
    user_id: Uuid,
}

impl<S, B> Service<ServiceRequest> for AsUserMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = S::Future;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        req.extensions_mut().insert(Claims::access(&self.user_id, 60));
        self.service.call(req)
    }
}
