pub mod animal;

pub use animal::{AdoptableAnimal, Animal, AnimalPatch, AnimalPhoto, Coordinates, NewAnimal};
