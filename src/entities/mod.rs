pub mod prelude;

pub mod animal_photos;
pub mod animals;
