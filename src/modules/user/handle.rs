use actix_web::{
    HttpRequest,
    cookie::{Cookie, time},
    get, post, web,
};

use crate::constants::REFRESH_TOKEN_COOKIE;
use crate::modules::user::{model, service::UserService};
use crate::{
    api::{error, success},
    middlewares::get_claims,
    utils::ValidatedJson,
};

fn refresh_cookie(token: String, max_age_secs: u64) -> Cookie<'static> {
    Cookie::build(REFRESH_TOKEN_COOKIE, token)
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(max_age_secs as i64))
        .finish()
}

#[get("/profile")]
pub async fn get_profile(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let id = get_claims(&req)?.sub;
    let user = user_service.get_by_id(id).await?;
    Ok(success::Success::ok(Some(user)).message("Profile retrieved successfully"))
}

#[post("/signup")]
pub async fn sign_up(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::SignUpModel>,
) -> Result<success::Success<model::SignUpResponse>, error::Error> {
    let user_id = user_service.sign_up(user_data.0).await?;
    Ok(success::Success::created(Some(model::SignUpResponse { id: user_id }))
        .message("Signup successful"))
}

#[post("/signin")]
pub async fn sign_in(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::SignInModel>,
) -> Result<success::Success<model::SignInResponse>, error::Error> {
    let (access_token, refresh_token) = user_service.sign_in(user_data.0).await?;

    Ok(success::Success::ok(Some(model::SignInResponse { access_token }))
        .message("Signin successful")
        .cookies(vec![refresh_cookie(refresh_token, user_service.refresh_expiration())]))
}

#[get("/signout")]
pub async fn sign_out(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let refresh_token = req.cookie(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_string());
    user_service.sign_out(refresh_token).await?;

    let cleared = Cookie::build(REFRESH_TOKEN_COOKIE, "")
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(0))
        .expires(time::OffsetDateTime::UNIX_EPOCH)
        .finish();

    Ok(success::Success::no_content().cookies(vec![cleared]))
}

#[post("/refresh")]
pub async fn refresh(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<model::SignInResponse>, error::Error> {
    let refresh_token = req.cookie(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_string());
    let (access_token, refresh_token) = user_service.refresh(refresh_token).await?;

    Ok(success::Success::ok(Some(model::SignInResponse { access_token }))
        .message("Refresh successful")
        .cookies(vec![refresh_cookie(refresh_token, user_service.refresh_expiration())]))
}
