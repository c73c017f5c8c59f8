pub mod ask;
pub mod corpus;
pub mod health;
