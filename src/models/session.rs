/// Credential used for every authenticated request of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    /// OAuth2 access token from a password grant
    Bearer {
        access_token: String,
        expires_in: Option<u64>,
    },
    /// Pre-issued header tokens bound to the operator's device id
    TokenPair {
        token: String,
        auth_token: String,
        device_id: String,
        device_type: String,
    },
}

impl Session {
    pub fn bearer(access_token: impl Into<String>, expires_in: Option<u64>) -> Self {
        Session::Bearer {
            access_token: access_token.into(),
            expires_in,
        }
    }

    pub fn from_token_pair(
        token: impl Into<String>,
        auth_token: impl Into<String>,
        device_id: impl Into<String>,
        device_type: impl Into<String>,
    ) -> Self {
        Session::TokenPair {
            token: token.into(),
            auth_token: auth_token.into(),
            device_id: device_id.into(),
            device_type: device_type.into(),
        }
    }

    /// Headers that authenticate a request with this session.
    pub fn auth_headers(&self) -> Vec<(String, String)> {
        match self {
            Session::Bearer { access_token, .. } => {
                vec![(
                    "authorization".to_string(),
                    format!("Bearer {}", access_token),
                )]
            }
            Session::TokenPair {
                token,
                auth_token,
                device_id,
                device_type,
            } => vec![
                ("deviceid".to_string(), device_id.clone()),
                ("devicetype".to_string(), device_type.clone()),
                ("token".to_string(), token.clone()),
                ("authtoken".to_string(), auth_token.clone()),
            ],
        }
    }
}
