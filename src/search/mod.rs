//! Remote search-index access: the REST client and its credential chain.

pub mod credentials;
pub mod remote;
