use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// An opaque session token, handed out at login and presented back
/// by clients as `Authorization: Bearer <token>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

const TOKEN_BYTES: usize = 32;

impl Token {
    pub fn generate() -> Result<Self, getrandom::Error> {
        let mut bytes = [0_u8; TOKEN_BYTES];
        getrandom::getrandom(&mut bytes)?;

        Ok(Self(URL_SAFE_NO_PAD.encode(bytes)))
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

pub struct Bearer(Token);

impl FromStr for Bearer {
    type Err = &'static str;

    fn from_str(header: &str) -> Result<Self, Self::Err> {
        let (scheme, token) = header
            .split_once(' ')
            .ok_or("no space in auth header")?;

        if scheme != "Bearer" {
            return Err("only bearer auth supported");
        }

        let token = token.trim();
        if token.is_empty() {
            return Err("empty bearer token");
        }

        Ok(Self(Token(token.into())))
    }
}

impl Bearer {
    pub fn into_token(self) -> Token {
        self.0
    }
}
