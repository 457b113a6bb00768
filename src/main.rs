use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};
use serde::{Deserialize, Serialize};
use warp::http::{StatusCode, Uri};
use warp::{Filter, Rejection, Reply};

mod activity;
mod args;
mod auth;
mod rosterd;
mod session;
mod user;

use args::Args;
use rosterd::{Error, LoginRequest, Rosterd, RosterdAuthed};
use user::Users;

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    let args = Args::parse();

    let addr = match args.addr() {
        Ok(addr) => addr,
        Err(e) => {
            error!("invalid listen address: {e}");
            std::process::exit(2);
        }
    };

    let users = match Users::load(args.users_file()) {
        Ok(users) => users,
        Err(e) => {
            error!("couldn't load users from {:?}: {e:?}", args.users_file());
            std::process::exit(1);
        }
    };

    let rosterd = Arc::new(Rosterd::new(users));

    let routes = routes(rosterd, args.static_dir())
        .recover(handle_rejection)
        .with(warp::log("rosterd"));

    info!("listening on {addr}");

    warp::serve(routes).run(addr).await;
}

#[derive(Debug, Deserialize)]
struct EmailQuery {
    email: String,
}

#[derive(Serialize)]
struct Detail {
    detail: String,
}

fn routes(
    rosterd: Arc<Rosterd>,
    static_dir: PathBuf,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let with_rosterd = warp::any().map(move || Arc::clone(&rosterd));

    let root = warp::path::end()
        .and(warp::get())
        .map(|| warp::redirect::found(Uri::from_static("/static/index.html")));

    let static_files = warp::path("static").and(warp::fs::dir(static_dir));

    let activities = warp::path!("activities")
        .and(warp::get())
        .and(with_rosterd.clone())
        .map(|rosterd: Arc<Rosterd>| warp::reply::json(&rosterd.activities()));

    let login = warp::path!("auth" / "login")
        .and(warp::post())
        .and(with_rosterd.clone())
        .and(warp::body::json())
        .and_then(|rosterd: Arc<Rosterd>, req: LoginRequest| async move {
            rosterd
                .login(&req)
                .map(|resp| warp::reply::json(&resp))
                .map_err(warp::reject::custom)
        });

    let logout = warp::path!("auth" / "logout")
        .and(warp::post())
        .and(with_rosterd.clone())
        .and(warp::header::optional::<String>("authorization"))
        .and_then(|rosterd: Arc<Rosterd>, header: Option<String>| async move {
            rosterd
                .authenticate(header.as_deref())
                .map(|authed| warp::reply::json(&authed.logout()))
                .map_err(warp::reject::custom)
        });

    let me = warp::path!("auth" / "me")
        .and(warp::get())
        .and(with_rosterd.clone())
        .and(warp::header::optional::<String>("authorization"))
        .and_then(|rosterd: Arc<Rosterd>, header: Option<String>| async move {
            rosterd
                .authenticate(header.as_deref())
                .map(|authed| warp::reply::json(&authed.whoami()))
                .map_err(warp::reject::custom)
        });

    let signup = warp::path!("activities" / String / "signup")
        .and(warp::post())
        .and(with_rosterd.clone())
        .and(warp::header::optional::<String>("authorization"))
        .and(warp::query::<EmailQuery>())
        .and_then(
            |activity: String,
             rosterd: Arc<Rosterd>,
             header: Option<String>,
             query: EmailQuery| async move {
                let name = urlencoding::decode(&activity)
                    .map_err(|_| warp::reject::custom(Error::NotFound))?;

                let authed = rosterd
                    .authenticate(header.as_deref())
                    .and_then(RosterdAuthed::require_staff)
                    .map_err(warp::reject::custom)?;

                authed
                    .signup(&name, &query.email)
                    .map(|msg| warp::reply::json(&msg))
                    .map_err(warp::reject::custom)
            },
        );

    let unregister = warp::path!("activities" / String / "unregister")
        .and(warp::delete())
        .and(with_rosterd)
        .and(warp::header::optional::<String>("authorization"))
        .and(warp::query::<EmailQuery>())
        .and_then(
            |activity: String,
             rosterd: Arc<Rosterd>,
             header: Option<String>,
             query: EmailQuery| async move {
                let name = urlencoding::decode(&activity)
                    .map_err(|_| warp::reject::custom(Error::NotFound))?;

                let authed = rosterd
                    .authenticate(header.as_deref())
                    .and_then(RosterdAuthed::require_staff)
                    .map_err(warp::reject::custom)?;

                authed
                    .unregister(&name, &query.email)
                    .map(|msg| warp::reply::json(&msg))
                    .map_err(warp::reject::custom)
            },
        );

    root.or(static_files)
        .or(activities)
        .or(login)
        .or(logout)
        .or(me)
        .or(signup)
        .or(unregister)
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, detail) = if let Some(e) = err.find::<Error>() {
        ((*e).into(), e.detail().to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".into())
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, "Invalid query string".into())
    } else if err
        .find::<warp::filters::body::BodyDeserializeError>()
        .is_some()
    {
        (StatusCode::BAD_REQUEST, "Invalid request body".into())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".into())
    } else {
        error!("unhandled rejection: {err:?}");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
    };

    let reply = warp::reply::json(&Detail { detail });
    Ok(warp::reply::with_status(reply, status))
}
