pub mod animal;
pub mod photo;
