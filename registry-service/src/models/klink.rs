use sqlx::FromRow;

/// A K-Link node of the network.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Klink {
    pub id: i64,
    /// Public identifier applications refer to.
    pub identifier: String,
    pub manager_id: i64,
    pub name: String,
    pub website: String,
    pub description: String,
    pub active: bool,
}
