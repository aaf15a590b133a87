mod indexing;
mod layout;
