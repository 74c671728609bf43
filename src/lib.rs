pub mod word_pos;
pub mod addcos;
pub mod embedding;
pub mod ppdb;
pub mod sentences;
pub mod lexsub;
