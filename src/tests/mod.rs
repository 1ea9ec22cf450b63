mod helpers;
mod indexing;
