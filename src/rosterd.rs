use std::{result, sync::Arc};

use log::{debug, error, info, trace};
use serde::{Deserialize, Serialize};
use warp::http;

use crate::activity::{Activity, Catalog};
use crate::auth::{Bearer, Token};
use crate::session::Sessions;
use crate::user::{Role, Users};

#[derive(Debug)]
pub struct Rosterd {
    users: Users,
    sessions: Sessions,
    catalog: Catalog,
}

/// An authenticated request, tied to the session that produced it.
/// `STAFF` records whether the role check for roster mutation has
/// passed; `signup`/`unregister` are only reachable once it has.
#[derive(Debug)]
pub struct RosterdAuthed<const STAFF: bool = false> {
    rosterd: Arc<Rosterd>,
    token: Token,
    username: String,
    role: Role,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct Whoami {
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

#[derive(Copy, Clone, Debug)]
pub enum Error {
    Internal,
    Unauthenticated(&'static str),
    Forbidden,
    NotFound,
    Conflict(&'static str),
}

pub type Result<T> = result::Result<T, Error>;

impl Error {
    pub fn detail(&self) -> &'static str {
        match self {
            Self::Internal => "Internal server error",
            Self::Unauthenticated(detail) => detail,
            Self::Forbidden => "Insufficient permissions",
            Self::NotFound => "Activity not found",
            Self::Conflict(detail) => detail,
        }
    }
}

impl Into<http::StatusCode> for Error {
    fn into(self) -> http::StatusCode {
        match self {
            Self::Internal => http::StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthenticated(_) => http::StatusCode::UNAUTHORIZED,
            Self::Forbidden => http::StatusCode::FORBIDDEN,
            Self::NotFound => http::StatusCode::NOT_FOUND,
            Self::Conflict(_) => http::StatusCode::BAD_REQUEST,
        }
    }
}

impl warp::reject::Reject for Error {}

impl Rosterd {
    pub fn new(users: Users) -> Self {
        Self {
            users,
            sessions: Sessions::new(),
            catalog: Catalog::seeded(),
        }
    }

    pub fn activities(&self) -> std::collections::BTreeMap<String, Activity> {
        trace!("activity snapshot requested");

        self.catalog.snapshot()
    }

    pub fn login(&self, req: &LoginRequest) -> Result<LoginResponse> {
        let role = self.users.verify(&req.username, &req.password).ok_or_else(|| {
            error!("rejecting login for {}", req.username);
            Error::Unauthenticated("Invalid username or password")
        })?;

        let token = self
            .sessions
            .create(&req.username, role)
            .map_err(|()| Error::Internal)?;

        info!("{} login: new session created", req.username);

        Ok(LoginResponse {
            access_token: token.into_string(),
            token_type: "bearer",
            username: req.username.clone(),
            role,
        })
    }

    pub fn authenticate(self: &Arc<Self>, header: Option<&str>) -> Result<RosterdAuthed> {
        let header = header.ok_or(Error::Unauthenticated("Authentication required"))?;

        let bearer: Bearer = header.parse().map_err(|e: &str| {
            error!("bad authorization header: {e}");
            Error::Unauthenticated("Authentication required")
        })?;

        let token = bearer.into_token();

        let session = self.sessions.resolve(&token).ok_or_else(|| {
            debug!("no session for presented token");
            Error::Unauthenticated("Invalid or expired session")
        })?;

        Ok(RosterdAuthed {
            rosterd: Arc::clone(self),
            token,
            username: session.username,
            role: session.role,
        })
    }
}

impl RosterdAuthed {
    pub fn require_staff(self) -> Result<RosterdAuthed<true>> {
        if self.role.is_staff() {
            Ok(RosterdAuthed {
                rosterd: self.rosterd,
                token: self.token,
                username: self.username,
                role: self.role,
            })
        } else {
            error!("{}: role may not modify rosters", self.username);
            Err(Error::Forbidden)
        }
    }
}

impl<const STAFF: bool> RosterdAuthed<STAFF> {
    pub fn whoami(&self) -> Whoami {
        trace!("{} whoami", self.username);

        Whoami {
            username: self.username.clone(),
            role: self.role,
        }
    }

    pub fn logout(self) -> Message {
        info!("{} logout", self.username);

        self.rosterd.sessions.revoke(&self.token);

        Message {
            message: "Logged out successfully".into(),
        }
    }
}

impl RosterdAuthed<true> {
    pub fn signup(&self, activity: &str, email: &str) -> Result<Message> {
        self.rosterd.catalog.signup(activity, email)?;

        info!("{} signed up {email} for {activity}", self.username);

        Ok(Message {
            message: format!("Signed up {email} for {activity}"),
        })
    }

    pub fn unregister(&self, activity: &str, email: &str) -> Result<Message> {
        self.rosterd.catalog.unregister(activity, email)?;

        info!("{} unregistered {email} from {activity}", self.username);

        Ok(Message {
            message: format!("Unregistered {email} from {activity}"),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn create_rosterd() -> Arc<Rosterd> {
        let users: Users = serde_json::from_str(
            r#"{
                "principal": { "password": "hunter2", "role": "admin" },
                "ms-frizzle": { "password": "magic", "role": "faculty" },
                "jake": { "password": "snake", "role": "student" }
            }"#,
        )
        .unwrap();

        Arc::new(Rosterd::new(users))
    }

    fn login(rosterd: &Arc<Rosterd>, username: &str, password: &str) -> LoginResponse {
        rosterd
            .login(&LoginRequest {
                username: username.into(),
                password: password.into(),
            })
            .unwrap()
    }

    fn header(token: &str) -> String {
        format!("Bearer {token}")
    }

    #[test]
    fn login_then_whoami_round_trips_identity() {
        let rosterd = create_rosterd();

        let resp = login(&rosterd, "principal", "hunter2");
        assert_eq!(resp.token_type, "bearer");
        assert_eq!(resp.username, "principal");
        assert_eq!(resp.role, Role::Admin);

        let authed = rosterd
            .authenticate(Some(&header(&resp.access_token)))
            .unwrap();
        let whoami = authed.whoami();
        assert_eq!(whoami.username, "principal");
        assert_eq!(whoami.role, Role::Admin);
    }

    #[test]
    fn bad_credentials_are_unauthenticated() {
        let rosterd = create_rosterd();

        let err = rosterd
            .login(&LoginRequest {
                username: "principal".into(),
                password: "wrong".into(),
            })
            .unwrap_err();
        assert!(matches!(err, Error::Unauthenticated(_)));

        let err = rosterd
            .login(&LoginRequest {
                username: "nobody".into(),
                password: "hunter2".into(),
            })
            .unwrap_err();
        assert!(matches!(err, Error::Unauthenticated(_)));
    }

    #[test]
    fn two_logins_give_independent_sessions() {
        let rosterd = create_rosterd();

        let first = login(&rosterd, "ms-frizzle", "magic");
        let second = login(&rosterd, "ms-frizzle", "magic");
        assert_ne!(first.access_token, second.access_token);

        // revoking the first leaves the second alive
        rosterd
            .authenticate(Some(&header(&first.access_token)))
            .unwrap()
            .logout();

        assert!(matches!(
            rosterd.authenticate(Some(&header(&first.access_token))),
            Err(Error::Unauthenticated(_))
        ));
        assert!(rosterd
            .authenticate(Some(&header(&second.access_token)))
            .is_ok());
    }

    #[test]
    fn logout_invalidates_the_token_everywhere() {
        let rosterd = create_rosterd();

        let resp = login(&rosterd, "principal", "hunter2");
        let auth = header(&resp.access_token);

        rosterd.authenticate(Some(&auth)).unwrap().logout();

        let err = rosterd.authenticate(Some(&auth)).unwrap_err();
        assert!(matches!(err, Error::Unauthenticated(_)));
    }

    #[test]
    fn missing_or_malformed_header_is_unauthenticated() {
        let rosterd = create_rosterd();

        for header in [None, Some("garbage"), Some("Basic dXNlcjpwYXNz")] {
            assert!(matches!(
                rosterd.authenticate(header),
                Err(Error::Unauthenticated(_))
            ));
        }
    }

    #[test]
    fn students_may_not_modify_rosters() {
        let rosterd = create_rosterd();

        let resp = login(&rosterd, "jake", "snake");
        let authed = rosterd
            .authenticate(Some(&header(&resp.access_token)))
            .unwrap();

        // whoami works for any authenticated role
        assert_eq!(authed.whoami().role, Role::Student);

        assert!(matches!(authed.require_staff(), Err(Error::Forbidden)));
    }

    #[test]
    fn staff_signup_and_duplicate_conflict() {
        let rosterd = create_rosterd();

        let resp = login(&rosterd, "principal", "hunter2");
        let authed = rosterd
            .authenticate(Some(&header(&resp.access_token)))
            .unwrap()
            .require_staff()
            .unwrap();

        let before = rosterd.activities()["Chess Club"].participants.len();

        authed
            .signup("Chess Club", "new@mergington.edu")
            .unwrap();

        let err = authed
            .signup("Chess Club", "new@mergington.edu")
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let after = rosterd.activities()["Chess Club"].participants.len();
        assert_eq!(after, before + 1);
    }

    #[test]
    fn staff_unregister() {
        let rosterd = create_rosterd();

        let resp = login(&rosterd, "ms-frizzle", "magic");
        let authed = rosterd
            .authenticate(Some(&header(&resp.access_token)))
            .unwrap()
            .require_staff()
            .unwrap();

        authed
            .unregister("Gym Class", "john@mergington.edu")
            .unwrap();

        assert_eq!(
            rosterd.activities()["Gym Class"].participants,
            ["olivia@mergington.edu"]
        );

        assert!(matches!(
            authed.unregister("Gym Class", "john@mergington.edu"),
            Err(Error::Conflict(_))
        ));
    }
}
