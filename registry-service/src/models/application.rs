use sqlx::FromRow;

/// Application registered against the network.
///
/// `auth_token` is the shared secret the application presents on v1
/// authentication; `klinks` holds K-Link identifiers the application belongs to.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Application {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub url: String,
    pub auth_token: String,
    pub permissions: Vec<String>,
    pub klinks: Vec<String>,
    pub active: bool,
}
