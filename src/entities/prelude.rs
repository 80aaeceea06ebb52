pub use super::animal_photos::Entity as AnimalPhotos;
pub use super::animals::Entity as Animals;
