use super::error::*;
use super::handler;
use crate::application_port::AuthService;
use crate::domain_model::*;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, reject};

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    // warp's cookie filter wants a static name; routes are built once per server.
    let cookie_name: &'static str =
        Box::leak(server.session_cookie.name.clone().into_boxed_str());
    let identity = with_identity(cookie_name, server.auth_service.clone());

    let register = warp::post()
        .and(warp::path!("auth" / "register"))
        .and(warp::body::json())
        .and(with(server.auth_service.clone()))
        .and_then(handler::register);

    let login = warp::post()
        .and(warp::path!("auth" / "login"))
        .and(warp::body::json())
        .and(with_session_token(cookie_name))
        .and(with(server.auth_service.clone()))
        .and(with(server.session_cookie.clone()))
        .and_then(handler::login);

    let logout = warp::post()
        .and(warp::path!("auth" / "logout"))
        .and(with_session_token(cookie_name))
        .and(with(server.auth_service.clone()))
        .and(with(server.session_cookie.clone()))
        .and_then(handler::logout);

    let me = warp::get()
        .and(warp::path!("auth" / "me"))
        .and(identity.clone())
        .and_then(handler::me);

    let list_posts = warp::get()
        .and(warp::path!("posts"))
        .and(with(server.post_service.clone()))
        .and_then(handler::list_posts);

    let get_post = warp::get()
        .and(warp::path!("posts" / PostId))
        .and(with(server.post_service.clone()))
        .and_then(handler::get_post);

    let create_post = warp::post()
        .and(warp::path!("posts"))
        .and(warp::body::json())
        .and(identity.clone())
        .and(with(server.post_service.clone()))
        .and_then(handler::create_post);

    let edit_post = warp::get()
        .and(warp::path!("posts" / PostId / "edit"))
        .and(identity.clone())
        .and(with(server.post_service.clone()))
        .and_then(handler::edit_post);

    let update_post = warp::put()
        .and(warp::path!("posts" / PostId))
        .and(warp::body::json())
        .and(identity.clone())
        .and(with(server.post_service.clone()))
        .and_then(handler::update_post);

    let delete_post = warp::delete()
        .and(warp::path!("posts" / PostId))
        .and(identity)
        .and(with(server.post_service.clone()))
        .and_then(handler::delete_post);

    register
        .or(login)
        .unify()
        .or(logout)
        .unify()
        .or(me)
        .unify()
        .or(list_posts)
        .unify()
        .or(get_post)
        .unify()
        .or(create_post)
        .unify()
        .or(edit_post)
        .unify()
        .or(update_post)
        .unify()
        .or(delete_post)
        .unify()
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_session_token(
    cookie_name: &'static str,
) -> impl Filter<Extract = (Option<SessionToken>,), Error = Infallible> + Clone {
    warp::cookie::optional::<String>(cookie_name).map(|value: Option<String>| {
        value
            .filter(|v| !v.is_empty())
            .map(SessionToken::from)
    })
}

/// Resolves the caller once per request. Anonymous callers pass through as
/// `None`; each handler's service call decides whether that is allowed.
fn with_identity(
    cookie_name: &'static str,
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (Option<User>,), Error = warp::Rejection> + Clone {
    with_session_token(cookie_name).and_then(move |token: Option<SessionToken>| {
        let auth_service = auth_service.clone();
        async move {
            auth_service
                .current_identity(token.as_ref())
                .await
                .map_err(ApiRejection::from)
                .map_err(reject::custom)
        }
    })
}
