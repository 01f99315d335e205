pub mod chat_store;
pub mod completion;
