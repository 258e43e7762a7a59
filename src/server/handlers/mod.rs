pub mod chat;
pub mod documents;
pub mod feedback;
pub mod health;
