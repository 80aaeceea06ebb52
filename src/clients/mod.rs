pub mod geoapify;
pub mod storage;
pub mod upstash;
